//! Frame check used by the MAX149x6 family when the CRC strap is set.
//!
//! The check is a 5-bit CRC (x^5 + x^4 + x^2 + 1, seed 0x1F) carried in the low bits of the
//! trailing frame byte. It covers the control byte, the data byte and three trailing zero bits.
//! Responses put chip status in the top two bits of the first byte, so those bits are left out
//! when checking what the chip sent back.

const CRC5_POLY: u8 = 0x15;
const CRC5_SEED: u8 = 0x1F;
const CRC5_MASK: u8 = 0x1F;

const RESPONSE_SKIP_BITS: u8 = 2;
const TRAILING_ZERO_BITS: u8 = 3;

fn shift_in(crc: u8, byte: u8, first_bit: u8, last_bit: u8) -> u8 {
    (first_bit..last_bit).fold(crc, |crc, i| {
        let data_bit = (byte >> (7 - i)) & 0x01;
        let top_bit = (crc >> 4) & 0x01;
        let shifted = (crc << 1) & CRC5_MASK;

        if data_bit ^ top_bit != 0 {
            shifted ^ CRC5_POLY
        } else {
            shifted
        }
    })
}

/// Computes the check byte for `bytes` (control byte, data byte).
///
/// `is_write` selects the layout: outbound frames are checked over all eight control bits,
/// responses only over the low six.
pub fn compute(bytes: [u8; 2], is_write: bool) -> u8 {
    let first_bit = if is_write { 0 } else { RESPONSE_SKIP_BITS };

    let crc = shift_in(CRC5_SEED, bytes[0], first_bit, 8);
    let crc = shift_in(crc, bytes[1], 0, 8);
    shift_in(crc, 0x00, 0, TRAILING_ZERO_BITS)
}

/// Checks a received response against the check byte that came with it.
pub fn verify(bytes: [u8; 2], expected: u8) -> bool {
    compute(bytes, false) == expected
}
