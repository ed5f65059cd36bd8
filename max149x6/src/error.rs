use embedded_hal::{blocking::spi::Transfer, digital::v2::OutputPin};

use crate::frame::FrameError;

/// Errors returned by every driver operation.
///
/// Multi-frame sequences (function changes, counter reloads) are not rolled back: if one of
/// their frames fails, the frames before it have already reached the chip.
pub enum Error<SPI: Transfer<u8>, CS: OutputPin> {
    /// Bad channel, register or value. Always reported before any bus traffic.
    InvalidArgument,
    /// The SPI transfer failed.
    Transport(SPI::Error),
    /// Driving the chip select line failed.
    ChipSelect(CS::Error),
    /// The check byte of a response did not match; the data was discarded.
    Integrity,
    /// A fixed-capacity buffer could not hold the requested setup.
    OutOfMemory,
}

impl<SPI: Transfer<u8>, CS: OutputPin> core::fmt::Debug for Error<SPI, CS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidArgument => write!(f, "InvalidArgument"),
            Error::Transport(_) => write!(f, "IO Error (Transport)"),
            Error::ChipSelect(_) => write!(f, "IO Error (ChipSelect)"),
            Error::Integrity => write!(f, "Integrity"),
            Error::OutOfMemory => write!(f, "OutOfMemory"),
        }
    }
}

impl<SPI: Transfer<u8>, CS: OutputPin> From<FrameError> for Error<SPI, CS> {
    fn from(_: FrameError) -> Self {
        Error::InvalidArgument
    }
}
