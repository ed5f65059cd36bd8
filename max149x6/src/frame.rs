//! Encoding and decoding of single-register SPI frames.
//!
//! ```text
//! byte 0: | chip addr (7:6) | register addr (5:1) | R/W (0) |
//! byte 1: | data                                            |
//! byte 2: | check byte (only with CRC enabled)              |
//! ```

use crate::crc;

/// Frame length without the check byte.
pub const FRAME_SIZE: usize = 2;
/// Frame length with the check byte.
pub const FRAME_SIZE_MAX: usize = FRAME_SIZE + 1;

pub const CHIP_ADDR_MASK: u8 = 0b1100_0000;
pub const REG_ADDR_MASK: u8 = 0b0011_1110;
pub const RW_MASK: u8 = 0b0000_0001;

/// Highest chip address that fits the control byte.
pub const MAX_CHIP_ADDR: u8 = field_get(CHIP_ADDR_MASK, 0xFF);
/// Highest register address that fits the control byte.
pub const MAX_REG_ADDR: u8 = field_get(REG_ADDR_MASK, 0xFF);

const DATA_OFFSET: usize = 1;
const CRC_OFFSET: usize = 2;

/// Shifts `value` into the position described by `mask`. Bits that do not fit are dropped.
pub const fn field_prep(mask: u8, value: u8) -> u8 {
    (value << mask.trailing_zeros()) & mask
}

/// Extracts the field described by `mask` from `reg`.
pub const fn field_get(mask: u8, reg: u8) -> u8 {
    (reg & mask) >> mask.trailing_zeros()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    BufferTooShort { needed: usize, actual: usize },
}

/// A decoded read response. `data` must not be trusted when `integrity_ok` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub data: u8,
    pub integrity_ok: bool,
}

pub const fn frame_len(crc_en: bool) -> usize {
    if crc_en {
        FRAME_SIZE_MAX
    } else {
        FRAME_SIZE
    }
}

pub const fn control_byte(chip_addr: u8, reg_addr: u8, write: bool) -> u8 {
    field_prep(CHIP_ADDR_MASK, chip_addr)
        | field_prep(REG_ADDR_MASK, reg_addr)
        | field_prep(RW_MASK, write as u8)
}

fn check_len(buf: &[u8], crc_en: bool) -> Result<usize, FrameError> {
    let needed = frame_len(crc_en);
    if buf.len() < needed {
        return Err(FrameError::BufferTooShort {
            needed,
            actual: buf.len(),
        });
    }

    Ok(needed)
}

/// Builds a register write frame in `buf` and returns its length.
pub fn encode_write(
    buf: &mut [u8],
    chip_addr: u8,
    reg_addr: u8,
    data: u8,
    crc_en: bool,
) -> Result<usize, FrameError> {
    let len = check_len(buf, crc_en)?;

    buf[0] = control_byte(chip_addr, reg_addr, true);
    buf[DATA_OFFSET] = data;
    if crc_en {
        buf[CRC_OFFSET] = crc::compute([buf[0], buf[DATA_OFFSET]], true);
    }

    Ok(len)
}

/// Builds a register read frame in `buf` and returns its length.
///
/// The data byte is clocked out during the turnaround and is zeroed.
pub fn encode_read(
    buf: &mut [u8],
    chip_addr: u8,
    reg_addr: u8,
    crc_en: bool,
) -> Result<usize, FrameError> {
    let len = check_len(buf, crc_en)?;

    buf[..len].fill(0);
    buf[0] = control_byte(chip_addr, reg_addr, false);
    if crc_en {
        buf[CRC_OFFSET] = crc::compute([buf[0], buf[DATA_OFFSET]], true);
    }

    Ok(len)
}

/// Extracts the data byte from a read response and checks it if CRC is enabled.
pub fn decode_read_response(buf: &[u8], crc_en: bool) -> Result<Response, FrameError> {
    check_len(buf, crc_en)?;

    let data = buf[DATA_OFFSET];
    let integrity_ok = !crc_en || crc::verify([buf[0], data], buf[CRC_OFFSET]);

    Ok(Response { data, integrity_ok })
}
