//! Simulated chip and pins for unit tests.

use core::convert::Infallible;
use std::{cell::RefCell, rc::Rc, vec::Vec};

use embedded_hal::{
    blocking::spi::Transfer,
    digital::v2::{InputPin, OutputPin},
};

use crate::crc;
use crate::frame::{field_get, CHIP_ADDR_MASK, REG_ADDR_MASK, RW_MASK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

struct State {
    chip_address: u8,
    crc_en: bool,
    regs: [u8; 32],
    clear_on_read: Vec<u8>,
    status: u8,
    frames: Vec<Vec<u8>>,
    crc_errors: usize,
    fail_in: Option<usize>,
    corrupt_next: Option<usize>,
}

/// A register file behind the SPI framing. Clones share the same state.
#[derive(Clone)]
pub struct SimChip(Rc<RefCell<State>>);

impl SimChip {
    pub fn new(chip_address: u8, crc_en: bool) -> Self {
        Self(Rc::new(RefCell::new(State {
            chip_address,
            crc_en,
            regs: [0; 32],
            clear_on_read: Vec::new(),
            status: 0,
            frames: Vec::new(),
            crc_errors: 0,
            fail_in: None,
            corrupt_next: None,
        })))
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.0.borrow().regs[reg as usize]
    }

    pub fn set_register(&self, reg: u8, value: u8) {
        self.0.borrow_mut().regs[reg as usize] = value;
    }

    /// Makes `reg` read as zero after it has been read once, like a latched fault register.
    pub fn clear_on_read(&self, reg: u8) {
        self.0.borrow_mut().clear_on_read.push(reg);
    }

    /// Status flags the chip reports in the top two bits of every response.
    pub fn set_status(&self, status: u8) {
        self.0.borrow_mut().status = status & 0xC0;
    }

    pub fn fail_next_transfer(&self) {
        self.fail_after(0);
    }

    /// Lets `transfers` more exchanges succeed, then fails one.
    pub fn fail_after(&self, transfers: usize) {
        self.0.borrow_mut().fail_in = Some(transfers);
    }

    /// Flips one bit of the next response, counting from bit 0 of the first byte.
    pub fn corrupt_next_response(&self, bit: usize) {
        self.0.borrow_mut().corrupt_next = Some(bit);
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.borrow().frames.clone()
    }

    pub fn transfers(&self) -> usize {
        self.0.borrow().frames.len()
    }

    pub fn writes(&self) -> usize {
        self.0
            .borrow()
            .frames
            .iter()
            .filter(|frame| frame[0] & RW_MASK != 0)
            .count()
    }

    /// Registers written, in bus order.
    pub fn written_registers(&self) -> Vec<(u8, u8)> {
        self.0
            .borrow()
            .frames
            .iter()
            .filter(|frame| frame[0] & RW_MASK != 0)
            .map(|frame| (field_get(REG_ADDR_MASK, frame[0]), frame[1]))
            .collect()
    }

    pub fn crc_errors(&self) -> usize {
        self.0.borrow().crc_errors
    }
}

impl Transfer<u8> for SimChip {
    type Error = BusFault;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        let mut state = self.0.borrow_mut();
        match state.fail_in {
            Some(0) => {
                state.fail_in = None;
                return Err(BusFault);
            }
            Some(n) => state.fail_in = Some(n - 1),
            None => {}
        }

        state.frames.push(words.to_vec());

        let control = words[0];
        let reg = field_get(REG_ADDR_MASK, control) as usize;
        let write = control & RW_MASK != 0;

        if state.crc_en && (words.len() != 3 || crc::compute([words[0], words[1]], true) != words[2])
        {
            state.crc_errors += 1;
            words.fill(0);
            return Ok(words);
        }

        if field_get(CHIP_ADDR_MASK, control) != state.chip_address {
            words.fill(0);
            return Ok(words);
        }

        let data = if write {
            state.regs[reg] = words[1];
            0
        } else {
            let value = state.regs[reg];
            if state.clear_on_read.contains(&(reg as u8)) {
                state.regs[reg] = 0;
            }
            value
        };

        words[0] = state.status | (control & !CHIP_ADDR_MASK);
        words[1] = data;
        if state.crc_en {
            words[2] = crc::compute([words[0], words[1]], false);
        }

        if let Some(bit) = state.corrupt_next.take() {
            if bit / 8 < words.len() {
                words[bit / 8] ^= 1 << (bit % 8);
            }
        }

        Ok(words)
    }
}

#[derive(Default)]
struct PinState {
    level: bool,
    selects: usize,
    deselects: usize,
}

/// Chip select or strap pin. Clones share the same state.
#[derive(Clone, Default)]
pub struct SimPin(Rc<RefCell<PinState>>);

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(level: bool) -> Self {
        let pin = Self::default();
        pin.0.borrow_mut().level = level;
        pin
    }

    pub fn deselects(&self) -> usize {
        self.0.borrow().deselects
    }

    pub fn selects(&self) -> usize {
        self.0.borrow().selects
    }
}

impl OutputPin for SimPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        state.level = false;
        state.selects += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        state.level = true;
        state.deselects += 1;
        Ok(())
    }
}

impl InputPin for SimPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.0.borrow().level)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.0.borrow().level)
    }
}
