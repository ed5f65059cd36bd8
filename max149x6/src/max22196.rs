//! MAX22196 octal industrial digital input with per-channel counters.

mod registers;

use embedded_hal::{blocking::spi::Transfer, digital::v2::OutputPin};

use crate::device::{ChipInfo, Config, Max149x6};
use crate::error::Error;
use crate::frame::{field_get, field_prep};

pub const CHANNELS: u8 = 8;

pub const CHIP: ChipInfo = ChipInfo {
    name: "MAX22196",
    channels: CHANNELS,
    max_register: registers::MAX_ADDR,
};

/// Glitch filter delays in microseconds. The index is the register code.
pub const FILTER_DELAY_US: [u32; 8] = [50, 100, 400, 800, 1800, 3200, 12800, 20000];

/// Register code for a filter delay, if the chip supports exactly that delay.
pub fn delay_code(delay_us: u32) -> Option<u8> {
    FILTER_DELAY_US
        .iter()
        .position(|&us| us == delay_us)
        .map(|code| code as u8)
}

/// Everything held in a channel's configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    pub high_threshold: bool,
    /// Channel sources current instead of sinking it.
    pub source: bool,
    /// Two-bit input current code.
    pub current: u8,
    pub filter_enabled: bool,
    /// One of [`FILTER_DELAY_US`].
    pub delay_us: u32,
}

pub struct Max22196<SPI, CS> {
    dev: Max149x6<SPI, CS>,
}

impl<SPI, CS> Max22196<SPI, CS>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    /// Takes the bus and clears the faults latched at power-up.
    pub fn init(spi: SPI, cs: CS, config: Config) -> Result<Self, Error<SPI, CS>> {
        let mut dev = Max149x6::new(spi, cs, CHIP, config)?;

        dev.reg_read(registers::fault1::ADDR)?;
        dev.reg_read(registers::fault2::ADDR)?;

        Ok(Self { dev })
    }

    /// Stops and zeroes every counter, then gives the bus back.
    ///
    /// On failure the driver is handed back with the error so the teardown can be retried.
    pub fn remove(mut self) -> Result<(SPI, CS), (Self, Error<SPI, CS>)> {
        for ch in 0..CHANNELS {
            if let Err(err) = self.set_chan_cnt(ch, 0) {
                return Err((self, err));
            }
        }

        Ok(self.release())
    }

    pub fn release(self) -> (SPI, CS) {
        self.dev.release()
    }

    /// Raw register access.
    pub fn device(&mut self) -> &mut Max149x6<SPI, CS> {
        &mut self.dev
    }

    pub fn input_state(&mut self, ch: u8) -> Result<bool, Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        let reg = self.dev.reg_read(registers::di_state::ADDR)?;
        Ok(field_get(registers::di_state::state(ch), reg) != 0)
    }

    /// Writes the whole configuration register of channel `ch` in one frame.
    pub fn chan_cfg(&mut self, ch: u8, config: &ChannelConfig) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        let delay = delay_code(config.delay_us).ok_or(Error::InvalidArgument)?;
        if config.current > field_get(registers::cfg::CURR_MASK, 0xFF) {
            return Err(Error::InvalidArgument);
        }

        let cfg_val = field_prep(registers::cfg::HITHR, config.high_threshold as u8)
            | field_prep(registers::cfg::SOURCE, config.source as u8)
            | field_prep(registers::cfg::CURR_MASK, config.current)
            | field_prep(registers::cfg::FLTEN, config.filter_enabled as u8)
            | field_prep(registers::cfg::DELAY_MASK, delay);

        self.dev.reg_write(registers::cfg::addr(ch), cfg_val)
    }

    fn count_enable(&mut self, ch: u8, enable: bool) -> Result<(), Error<SPI, CS>> {
        self.dev.reg_update(
            registers::start_stop::ADDR,
            registers::start_stop::cnt(ch),
            field_prep(registers::start_stop::cnt(ch), enable as u8),
        )
    }

    /// Loads the counter of channel `ch`.
    ///
    /// Counting is stopped while the two halves are written so the chip never latches a torn
    /// value. A failure partway leaves the counter stopped or half written.
    pub fn set_chan_cnt(&mut self, ch: u8, value: u16) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        let [msb, lsb] = value.to_be_bytes();

        self.count_enable(ch, false)?;
        self.dev.reg_write(registers::cnt::lsb(ch), lsb)?;
        self.dev.reg_write(registers::cnt::msb(ch), msb)?;
        self.count_enable(ch, true)
    }

    /// Reads the counter of channel `ch`, pausing it for the duration of the read.
    pub fn get_chan_cnt(&mut self, ch: u8) -> Result<u16, Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        self.count_enable(ch, false)?;
        let lsb = self.dev.reg_read(registers::cnt::lsb(ch))?;
        let msb = self.dev.reg_read(registers::cnt::msb(ch))?;
        self.count_enable(ch, true)?;

        Ok(u16::from_be_bytes([msb, lsb]))
    }

    pub fn filter_bypass(&mut self, ch: u8) -> Result<bool, Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        let reg = self.dev.reg_read(registers::cfg::addr(ch))?;
        Ok(field_get(registers::cfg::FLTEN, reg) == 0)
    }

    pub fn set_filter_bypass(&mut self, ch: u8, bypass: bool) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        self.dev.reg_update(
            registers::cfg::addr(ch),
            registers::cfg::FLTEN,
            field_prep(registers::cfg::FLTEN, !bypass as u8),
        )
    }

    /// Filter delay of channel `ch` in microseconds.
    pub fn filter_delay(&mut self, ch: u8) -> Result<u32, Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        let reg = self.dev.reg_read(registers::cfg::addr(ch))?;
        let code = field_get(registers::cfg::DELAY_MASK, reg);
        Ok(FILTER_DELAY_US[code as usize])
    }

    /// Selects the filter delay of channel `ch`. Only the values in [`FILTER_DELAY_US`] are
    /// accepted.
    pub fn set_filter_delay(&mut self, ch: u8, delay_us: u32) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;
        let code = delay_code(delay_us).ok_or(Error::InvalidArgument)?;

        self.dev.reg_update(
            registers::cfg::addr(ch),
            registers::cfg::DELAY_MASK,
            field_prep(registers::cfg::DELAY_MASK, code),
        )
    }

    /// Reads (and thereby clears) the FAULT1 register. Meant for the fault pin handler.
    pub fn fault1(&mut self) -> Result<u8, Error<SPI, CS>> {
        let fault = self.dev.reg_read(registers::fault1::ADDR)?;
        if fault != 0 {
            log::info!("MAX22196 fault detected: fault1 0x{:02x}", fault);
        }
        Ok(fault)
    }

    pub fn fault2(&mut self) -> Result<u8, Error<SPI, CS>> {
        let fault = self.dev.reg_read(registers::fault2::ADDR)?;
        if fault != 0 {
            log::info!("MAX22196 fault detected: fault2 0x{:02x}", fault);
        }
        Ok(fault)
    }
}
