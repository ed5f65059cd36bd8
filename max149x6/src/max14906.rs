//! MAX14906 quad-channel industrial digital output / digital input.

mod registers;

use embedded_hal::{blocking::spi::Transfer, digital::v2::OutputPin};

use crate::device::{ChipInfo, Config, Max149x6};
use crate::error::Error;
use crate::frame::{field_get, field_prep};

pub const CHANNELS: u8 = 4;

pub const CHIP: ChipInfo = ChipInfo {
    name: "MAX14906",
    channels: CHANNELS,
    max_register: registers::MAX_ADDR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Function {
    Output,
    Input,
    /// Input with the output stage parked in push-pull with clamp.
    HighZ,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverMode {
    HighSide = registers::config_do::HIGH_SIDE,
    HighSideInrush = registers::config_do::HIGH_SIDE_INRUSH,
    PushPullClamp = registers::config_do::PUSH_PULL_CLAMP,
    PushPull = registers::config_do::PUSH_PULL,
}

impl TryFrom<u8> for DriverMode {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            registers::config_do::HIGH_SIDE => Ok(DriverMode::HighSide),
            registers::config_do::HIGH_SIDE_INRUSH => Ok(DriverMode::HighSideInrush),
            registers::config_do::PUSH_PULL_CLAMP => Ok(DriverMode::PushPullClamp),
            registers::config_do::PUSH_PULL => Ok(DriverMode::PushPull),
            _ => Err(()),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CurrentLimit {
    Ma600 = 0,
    Ma130 = 1,
    Ma300 = 2,
    Ma1200 = 3,
}

impl CurrentLimit {
    pub const fn milliamps(self) -> u32 {
        match self {
            CurrentLimit::Ma600 => 600,
            CurrentLimit::Ma130 => 130,
            CurrentLimit::Ma300 => 300,
            CurrentLimit::Ma1200 => 1200,
        }
    }
}

impl TryFrom<u8> for CurrentLimit {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CurrentLimit::Ma600),
            1 => Ok(CurrentLimit::Ma130),
            2 => Ok(CurrentLimit::Ma300),
            3 => Ok(CurrentLimit::Ma1200),
            _ => Err(()),
        }
    }
}

pub struct Max14906<SPI, CS> {
    dev: Max149x6<SPI, CS>,
}

impl<SPI, CS> Max14906<SPI, CS>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    /// Takes the bus and clears the faults latched at power-up.
    pub fn init(spi: SPI, cs: CS, config: Config) -> Result<Self, Error<SPI, CS>> {
        let mut dev = Max149x6::new(spi, cs, CHIP, config)?;

        // Reading the fault registers clears them; the values are meaningless after power-up.
        for reg in [
            registers::doilevel::ADDR,
            registers::opn_wir_flt::ADDR,
            registers::shd_vdd_flt::ADDR,
            registers::global_flt::ADDR,
        ] {
            dev.reg_read(reg)?;
        }

        Ok(Self { dev })
    }

    pub fn release(self) -> (SPI, CS) {
        self.dev.release()
    }

    /// Raw register access.
    pub fn device(&mut self) -> &mut Max149x6<SPI, CS> {
        &mut self.dev
    }

    /// Drives the output of channel `ch`.
    pub fn ch_set(&mut self, ch: u8, on: bool) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        self.dev.reg_update(
            registers::setout::ADDR,
            registers::setout::out(ch),
            field_prep(registers::setout::out(ch), on as u8),
        )
    }

    /// Logic level seen on the channel's pin.
    pub fn ch_get(&mut self, ch: u8) -> Result<bool, Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        let reg = self.dev.reg_read(registers::doilevel::ADDR)?;
        Ok(field_get(registers::doilevel::level(ch), reg) != 0)
    }

    /// Switches channel `ch` between output, input and high impedance.
    ///
    /// High impedance parks the output stage in push-pull with clamp before the channel is
    /// turned into an input; the chip must never see the reverse order. If the second frame
    /// fails the driver mode has already been changed.
    pub fn ch_func(&mut self, ch: u8, function: Function) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        if function == Function::HighZ {
            self.set_do_mode(ch, DriverMode::PushPullClamp)?;
        }

        let input = matches!(function, Function::Input | Function::HighZ);
        self.dev.reg_update(
            registers::setout::ADDR,
            registers::setout::dir(ch),
            field_prep(registers::setout::dir(ch), input as u8),
        )
    }

    pub fn set_do_mode(&mut self, ch: u8, mode: DriverMode) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        self.dev.reg_update(
            registers::config_do::ADDR,
            registers::config_do::mode(ch),
            field_prep(registers::config_do::mode(ch), mode as u8),
        )
    }

    pub fn do_mode(&mut self, ch: u8) -> Result<DriverMode, Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        let reg = self.dev.reg_read(registers::config_do::ADDR)?;
        DriverMode::try_from(field_get(registers::config_do::mode(ch), reg))
            .map_err(|_| Error::InvalidArgument)
    }

    pub fn climit_set(&mut self, ch: u8, limit: CurrentLimit) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        self.dev.reg_update(
            registers::curr_lim::ADDR,
            registers::curr_lim::cl(ch),
            field_prep(registers::curr_lim::cl(ch), limit as u8),
        )
    }

    pub fn climit_get(&mut self, ch: u8) -> Result<CurrentLimit, Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        let reg = self.dev.reg_read(registers::curr_lim::ADDR)?;
        CurrentLimit::try_from(field_get(registers::curr_lim::cl(ch), reg))
            .map_err(|_| Error::InvalidArgument)
    }

    /// Lets the host drive the status LEDs instead of the chip.
    pub fn sled_manual(&mut self, enable: bool) -> Result<(), Error<SPI, CS>> {
        self.dev.reg_update(
            registers::config1::ADDR,
            registers::config1::SLED,
            field_prep(registers::config1::SLED, enable as u8),
        )
    }

    pub fn sled_set(&mut self, ch: u8, on: bool) -> Result<(), Error<SPI, CS>> {
        self.dev.check_channel(ch)?;

        self.dev.reg_update(
            registers::setled::ADDR,
            registers::setled::sled(ch),
            field_prep(registers::setled::sled(ch), on as u8),
        )
    }

    /// Reads (and thereby acknowledges) the interrupt register. Meant for the FAULT pin handler.
    pub fn read_interrupt(&mut self) -> Result<u8, Error<SPI, CS>> {
        let irq = self.dev.reg_read(registers::interrupt::ADDR)?;
        if irq != 0 {
            log::info!("MAX14906 fault detected: interrupt 0x{:02x}", irq);
        }
        Ok(irq)
    }
}
