//! Register access shared by every chip of the family.

use embedded_hal::{
    blocking::spi::Transfer,
    digital::v2::{InputPin, OutputPin},
};

use crate::error::Error;
use crate::frame::{self, FRAME_SIZE_MAX};

/// Static description of one chip family member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipInfo {
    pub name: &'static str,
    pub channels: u8,
    pub max_register: u8,
}

/// Per-instance settings fixed at initialization.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Address set by the chip's A0/A1 pins.
    pub chip_address: u8,
    /// Whether the chip expects and sends the trailing check byte.
    pub crc_en: bool,
}

/// Reads the CRC strap pin. A high level means the chip runs with CRC enabled.
pub fn crc_strapped<P: InputPin>(pin: &P) -> Result<bool, P::Error> {
    pin.is_high()
}

/// One chip on the SPI bus.
///
/// The frame buffer is reused by every exchange, so all operations take `&mut self`. Share an
/// instance between contexts only behind a lock.
pub struct Max149x6<SPI, CS> {
    spi: SPI,
    cs: CS,
    chip: ChipInfo,
    chip_address: u8,
    crc_en: bool,
    buff: [u8; FRAME_SIZE_MAX],
}

impl<SPI, CS> Max149x6<SPI, CS>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    /// Wraps the bus. No frames are exchanged here; the chip modules clear the power-up faults.
    pub fn new(spi: SPI, cs: CS, chip: ChipInfo, config: Config) -> Result<Self, Error<SPI, CS>> {
        if config.chip_address > frame::MAX_CHIP_ADDR || chip.max_register > frame::MAX_REG_ADDR
        {
            return Err(Error::InvalidArgument);
        }

        log::debug!(
            "{} at chip address {} (crc {})",
            chip.name,
            config.chip_address,
            if config.crc_en { "on" } else { "off" }
        );

        Ok(Self {
            spi,
            cs,
            chip,
            chip_address: config.chip_address,
            crc_en: config.crc_en,
            buff: [0; FRAME_SIZE_MAX],
        })
    }

    /// Gives the bus and chip select back.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    pub fn chip(&self) -> &ChipInfo {
        &self.chip
    }

    pub fn crc_enabled(&self) -> bool {
        self.crc_en
    }

    pub fn check_channel(&self, ch: u8) -> Result<(), Error<SPI, CS>> {
        if ch >= self.chip.channels {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    fn check_register(&self, reg: u8) -> Result<(), Error<SPI, CS>> {
        if reg > self.chip.max_register {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    pub fn reg_read(&mut self, reg: u8) -> Result<u8, Error<SPI, CS>> {
        self.check_register(reg)?;

        let len = frame::encode_read(&mut self.buff, self.chip_address, reg, self.crc_en)?;
        self.transfer(len)?;

        let response = frame::decode_read_response(&self.buff[..len], self.crc_en)?;
        if !response.integrity_ok {
            log::warn!("{}: crc mismatch reading 0x{:02x}", self.chip.name, reg);
            return Err(Error::Integrity);
        }

        Ok(response.data)
    }

    pub fn reg_write(&mut self, reg: u8, value: u8) -> Result<(), Error<SPI, CS>> {
        self.check_register(reg)?;

        let len = frame::encode_write(&mut self.buff, self.chip_address, reg, value, self.crc_en)?;
        self.transfer(len)
    }

    /// Replaces the bits of `reg` selected by `mask` with the same bits of `value`.
    ///
    /// This is a read followed by a write. Bits the chip changes in between (latched faults)
    /// are written back with their old value.
    pub fn reg_update(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Error<SPI, CS>> {
        let reg_val = self.reg_read(reg)?;
        let reg_val = (reg_val & !mask) | (value & mask);
        self.reg_write(reg, reg_val)
    }

    fn transfer(&mut self, len: usize) -> Result<(), Error<SPI, CS>> {
        log::trace!("{} tx {:02x?}", self.chip.name, &self.buff[..len]);

        self.cs.set_low().map_err(Error::ChipSelect)?;
        let result = self.spi.transfer(&mut self.buff[..len]);

        let mut response = [0; FRAME_SIZE_MAX];
        let result = result.map(|rx| {
            let n = rx.len().min(len);
            response[..n].copy_from_slice(&rx[..n]);
        });

        // Release the chip even when the transfer failed.
        let deselect = self.cs.set_high();
        result.map_err(Error::Transport)?;
        deselect.map_err(Error::ChipSelect)?;

        self.buff[..len].copy_from_slice(&response[..len]);
        log::trace!("{} rx {:02x?}", self.chip.name, &self.buff[..len]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimChip, SimPin};

    const CHIP: ChipInfo = ChipInfo {
        name: "TEST",
        channels: 4,
        max_register: 0x0F,
    };

    fn device(crc_en: bool) -> (Max149x6<SimChip, SimPin>, SimChip, SimPin) {
        let sim = SimChip::new(0, crc_en);
        let cs = SimPin::new();
        let config = Config {
            chip_address: 0,
            crc_en,
        };
        let dev = Max149x6::new(sim.clone(), cs.clone(), CHIP, config).unwrap();
        (dev, sim, cs)
    }

    #[test]
    fn rejects_bad_chip_address() {
        let config = Config {
            chip_address: 4,
            crc_en: false,
        };
        let result = Max149x6::new(SimChip::new(0, false), SimPin::new(), CHIP, config);
        assert!(matches!(result, Err(Error::InvalidArgument)));
    }

    #[test]
    fn strap_pin_selects_crc() {
        assert_eq!(crc_strapped(&SimPin::with_level(true)), Ok(true));
        assert_eq!(crc_strapped(&SimPin::with_level(false)), Ok(false));
    }

    #[test]
    fn read_and_write_one_frame_each() {
        for crc_en in [false, true] {
            let (mut dev, sim, cs) = device(crc_en);
            dev.reg_write(0x0E, 0xA5).unwrap();
            assert_eq!(dev.reg_read(0x0E).unwrap(), 0xA5);

            assert_eq!(sim.transfers(), 2);
            assert_eq!(cs.selects(), 2);
            assert_eq!(cs.deselects(), 2);
            let frame_len = if crc_en { 3 } else { 2 };
            assert!(sim.frames().iter().all(|f| f.len() == frame_len));
        }
    }

    #[test]
    fn addresses_frames_to_the_configured_chip() {
        let sim = SimChip::new(2, true);
        let config = Config {
            chip_address: 2,
            crc_en: true,
        };
        let mut dev = Max149x6::new(sim.clone(), SimPin::new(), CHIP, config).unwrap();
        dev.reg_write(0x03, 0x42).unwrap();

        assert_eq!(sim.frames()[0][0], 0x87);
        assert_eq!(sim.register(0x03), 0x42);
        assert_eq!(sim.crc_errors(), 0);
    }

    #[test]
    fn rejects_out_of_range_register_without_traffic() {
        let (mut dev, sim, _) = device(false);
        assert!(matches!(dev.reg_read(0x10), Err(Error::InvalidArgument)));
        assert!(matches!(dev.reg_write(0x10, 0), Err(Error::InvalidArgument)));
        assert!(matches!(
            dev.reg_update(0x10, 0xFF, 0),
            Err(Error::InvalidArgument)
        ));
        assert_eq!(sim.transfers(), 0);
    }

    #[test]
    fn update_matches_read_modify_write() {
        let (mut dev, sim, _) = device(true);
        for mask in [0x00, 0xFF, 0x0F, 0xA0, 0x01] {
            for value in [0x00, 0xFF, 0x5A] {
                sim.set_register(0x05, 0xC3);
                dev.reg_update(0x05, mask, value).unwrap();
                assert_eq!(sim.register(0x05), (0xC3 & !mask) | (value & mask));
            }
        }
    }

    #[test]
    fn corrupted_response_is_an_integrity_failure() {
        let (mut dev, sim, _) = device(true);
        sim.set_register(0x02, 0x5A);
        sim.set_status(0xC0);
        assert_eq!(dev.reg_read(0x02).unwrap(), 0x5A);

        // The top two bits of the first response byte carry status and are not checked.
        let checked_bits = (0..6).chain(8..24);
        for bit in checked_bits {
            sim.corrupt_next_response(bit);
            assert!(
                matches!(dev.reg_read(0x02), Err(Error::Integrity)),
                "bit {} not detected",
                bit
            );
        }
        assert_eq!(dev.reg_read(0x02).unwrap(), 0x5A);
    }

    #[test]
    fn update_sends_no_write_after_a_corrupted_read() {
        let (mut dev, sim, _) = device(true);
        sim.set_register(0x04, 0x3C);
        let writes = sim.writes();

        sim.corrupt_next_response(9);
        assert!(matches!(
            dev.reg_update(0x04, 0x0F, 0x00),
            Err(Error::Integrity)
        ));
        assert_eq!(sim.writes(), writes);
        assert_eq!(sim.register(0x04), 0x3C);
    }

    #[test]
    fn transport_failure_is_propagated_and_chip_released() {
        let (mut dev, sim, cs) = device(false);
        sim.fail_next_transfer();
        assert!(matches!(dev.reg_read(0x01), Err(Error::Transport(_))));
        assert_eq!(cs.deselects(), 1);

        sim.fail_next_transfer();
        assert!(matches!(dev.reg_update(0x01, 0x01, 0x01), Err(Error::Transport(_))));
        assert_eq!(sim.transfers(), 0);
    }

    #[test]
    fn release_returns_the_bus() {
        let (dev, _, _) = device(false);
        let (spi, _cs) = dev.release();
        assert_eq!(spi.transfers(), 0);
    }
}
