//! MAX22196 exposed as a catalog of named, string-valued attributes.
//!
//! Each enabled input channel carries the [`ATTRIBUTES`] catalog. Values are rendered as
//! decimal integers, except `filter_delay_available` which lists every supported delay
//! followed by a space. [`DEBUG_ATTRIBUTES`] and the raw register accessors are device wide.

use core::fmt::Write;

use embedded_hal::{blocking::spi::Transfer, digital::v2::OutputPin};
use heapless::{String, Vec};

use crate::error::Error;
use crate::max22196::{self, Max22196, FILTER_DELAY_US};

pub const MAX_VALUE_LEN: usize = 64;
pub type Value = String<MAX_VALUE_LEN>;

const MAX_CHANNELS: usize = max22196::CHANNELS as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shared {
    Separate,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Show {
    Raw,
    Offset,
    Scale,
    FilterBypass,
    FilterDelay,
    FilterDelayAvailable,
    Fault1,
    Fault2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Store {
    FilterBypass,
    FilterDelay,
}

/// A named attribute. Without `show` it is write-only, without `store` read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Attribute {
    pub name: &'static str,
    pub show: Option<Show>,
    pub store: Option<Store>,
    pub shared: Shared,
}

impl Attribute {
    const fn read_only(name: &'static str, show: Show, shared: Shared) -> Self {
        Self {
            name,
            show: Some(show),
            store: None,
            shared,
        }
    }

    const fn read_write(name: &'static str, show: Show, store: Store) -> Self {
        Self {
            name,
            show: Some(show),
            store: Some(store),
            shared: Shared::Separate,
        }
    }
}

pub const ATTRIBUTES: [Attribute; 6] = [
    Attribute::read_only("raw", Show::Raw, Shared::Separate),
    Attribute::read_only("offset", Show::Offset, Shared::Separate),
    Attribute::read_only("scale", Show::Scale, Shared::Separate),
    Attribute::read_write("filter_bypass", Show::FilterBypass, Store::FilterBypass),
    Attribute::read_write("filter_delay", Show::FilterDelay, Store::FilterDelay),
    Attribute::read_only(
        "filter_delay_available",
        Show::FilterDelayAvailable,
        Shared::All,
    ),
];

pub const DEBUG_ATTRIBUTES: [Attribute; 2] = [
    Attribute::read_only("fault1", Show::Fault1, Shared::All),
    Attribute::read_only("fault2", Show::Fault2, Shared::All),
];

fn find(catalog: &'static [Attribute], name: &str) -> Option<&'static Attribute> {
    catalog.iter().find(|attr| attr.name == name)
}

/// One enabled input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    pub index: u8,
    pub attributes: &'static [Attribute],
}

pub struct Max22196Iio<SPI, CS> {
    dev: Max22196<SPI, CS>,
    channels: Vec<Channel, MAX_CHANNELS>,
}

impl<SPI, CS> Max22196Iio<SPI, CS>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    /// Exposes the channels whose entry in `ch_enabled` is set, in ascending order.
    pub fn new(
        dev: Max22196<SPI, CS>,
        ch_enabled: [bool; MAX_CHANNELS],
    ) -> Result<Self, Error<SPI, CS>> {
        let mut channels = Vec::new();
        for (index, _) in ch_enabled.iter().enumerate().filter(|(_, enabled)| **enabled) {
            channels
                .push(Channel {
                    index: index as u8,
                    attributes: &ATTRIBUTES,
                })
                .map_err(|_| Error::OutOfMemory)?;
        }

        log::debug!("MAX22196 exposing {} channels", channels.len());

        Ok(Self { dev, channels })
    }

    pub fn release(self) -> Max22196<SPI, CS> {
        self.dev
    }

    pub fn device(&mut self) -> &mut Max22196<SPI, CS> {
        &mut self.dev
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    fn check_enabled(&self, ch: u8) -> Result<(), Error<SPI, CS>> {
        if !self.channels.iter().any(|channel| channel.index == ch) {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    fn check_scope(&self, attr: &Attribute, ch: u8) -> Result<(), Error<SPI, CS>> {
        match attr.shared {
            Shared::All => Ok(()),
            Shared::Separate => self.check_enabled(ch),
        }
    }

    /// Renders the channel attribute `name` of channel `ch`.
    pub fn show(&mut self, name: &str, ch: u8) -> Result<Value, Error<SPI, CS>> {
        let attr = find(&ATTRIBUTES, name).ok_or(Error::InvalidArgument)?;
        let show = attr.show.ok_or(Error::InvalidArgument)?;
        self.check_scope(attr, ch)?;

        self.show_value(show, ch)
    }

    /// Parses `value` and applies it to the channel attribute `name` of channel `ch`.
    ///
    /// Malformed or unsupported values are rejected before the chip is touched.
    pub fn store(&mut self, name: &str, ch: u8, value: &str) -> Result<(), Error<SPI, CS>> {
        let attr = find(&ATTRIBUTES, name).ok_or(Error::InvalidArgument)?;
        let store = attr.store.ok_or(Error::InvalidArgument)?;
        self.check_scope(attr, ch)?;

        let val: i32 = value.trim().parse().map_err(|_| Error::InvalidArgument)?;

        match store {
            Store::FilterBypass => {
                let bypass = match val {
                    0 => false,
                    1 => true,
                    _ => return Err(Error::InvalidArgument),
                };
                self.dev.set_filter_bypass(ch, bypass)
            }
            Store::FilterDelay => {
                let delay_us = u32::try_from(val).map_err(|_| Error::InvalidArgument)?;
                self.dev.set_filter_delay(ch, delay_us)
            }
        }
    }

    /// Renders the device-wide debug attribute `name`.
    pub fn show_debug(&mut self, name: &str) -> Result<Value, Error<SPI, CS>> {
        let attr = find(&DEBUG_ATTRIBUTES, name).ok_or(Error::InvalidArgument)?;
        let show = attr.show.ok_or(Error::InvalidArgument)?;

        self.show_value(show, 0)
    }

    pub fn debug_read(&mut self, reg: u8) -> Result<u8, Error<SPI, CS>> {
        self.dev.device().reg_read(reg)
    }

    pub fn debug_write(&mut self, reg: u8, value: u8) -> Result<(), Error<SPI, CS>> {
        self.dev.device().reg_write(reg, value)
    }

    fn show_value(&mut self, show: Show, ch: u8) -> Result<Value, Error<SPI, CS>> {
        let mut value = Value::new();

        let val = match show {
            Show::Raw => self.dev.input_state(ch)? as u32,
            Show::Offset => 0,
            Show::Scale => 1,
            Show::FilterBypass => self.dev.filter_bypass(ch)? as u32,
            Show::FilterDelay => self.dev.filter_delay(ch)?,
            Show::Fault1 => self.dev.fault1()? as u32,
            Show::Fault2 => self.dev.fault2()? as u32,
            Show::FilterDelayAvailable => {
                for us in FILTER_DELAY_US {
                    write!(value, "{} ", us).map_err(|_| Error::OutOfMemory)?;
                }
                return Ok(value);
            }
        };

        write!(value, "{}", val).map_err(|_| Error::OutOfMemory)?;
        Ok(value)
    }
}
