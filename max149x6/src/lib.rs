//! Register-level driver for the MAX149x6 family of industrial digital I/O chips.
//!
//! All chips in the family share one SPI framing: a control byte carrying the chip address,
//! register address and R/W bit, one data byte and, when the CRC strap is set, a trailing check
//! byte. [`device::Max149x6`] implements that framing; [`max14906`] and [`max22196`] build the
//! per-chip configuration on top of it and [`iio`] exposes the MAX22196 as a catalog of named,
//! string-valued attributes.

#![cfg_attr(not(test), no_std)]

pub mod crc;
pub mod device;
pub mod error;
pub mod frame;
pub mod iio;
pub mod max14906;
pub mod max22196;

#[cfg(test)]
mod sim;

pub use device::{crc_strapped, ChipInfo, Config, Max149x6};
pub use error::Error;
pub use iio::Max22196Iio;
pub use max14906::Max14906;
pub use max22196::Max22196;
