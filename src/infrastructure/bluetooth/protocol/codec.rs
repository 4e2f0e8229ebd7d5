//! Wire Codec
//!
//! Conversions between the camera's fixed-width wire fields and application values.
//! Multi-byte fields are little-endian. Continuous values (aperture, color
//! correction) travel as signed 5.11 fixed-point.

use thiserror::Error;

/// Number of fractional bits in the camera's fixed-point format.
pub const FIXED_FRACTION_BITS: u32 = 11;

/// `1 << FIXED_FRACTION_BITS`
pub const FIXED_ONE: f64 = 2048.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("field of {width} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("invalid BCD byte {0:#04x}")]
    InvalidBcd(u8),
}

fn field<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], CodecError> {
    offset
        .checked_add(N)
        .and_then(|end| buf.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(CodecError::OutOfBounds {
            offset,
            width: N,
            len: buf.len(),
        })
}

pub fn u8_at(buf: &[u8], offset: usize) -> Result<u8, CodecError> {
    field::<1>(buf, offset).map(|b| b[0])
}

pub fn i8_at(buf: &[u8], offset: usize) -> Result<i8, CodecError> {
    field::<1>(buf, offset).map(i8::from_le_bytes)
}

pub fn u16_at(buf: &[u8], offset: usize) -> Result<u16, CodecError> {
    field(buf, offset).map(u16::from_le_bytes)
}

pub fn i16_at(buf: &[u8], offset: usize) -> Result<i16, CodecError> {
    field(buf, offset).map(i16::from_le_bytes)
}

pub fn i32_at(buf: &[u8], offset: usize) -> Result<i32, CodecError> {
    field(buf, offset).map(i32::from_le_bytes)
}

pub fn i64_at(buf: &[u8], offset: usize) -> Result<i64, CodecError> {
    field(buf, offset).map(i64::from_le_bytes)
}

pub fn bool_at(buf: &[u8], offset: usize) -> Result<bool, CodecError> {
    u8_at(buf, offset).map(|b| b != 0)
}

/// Encode a real value as camera fixed-point.
///
/// The integer part lands in the bits above [`FIXED_FRACTION_BITS`] (floored, so
/// negative values carry a positive fraction), and the fraction is found by a
/// binary search over the 11 fractional bits, halving from 0.5.
pub fn float_to_fixed(value: f64) -> i16 {
    let whole = value.floor();
    let mut fraction = value - whole;
    let mut fixed = (whole as i32) << FIXED_FRACTION_BITS;

    let mut step = 0.5;
    for bit in (0..FIXED_FRACTION_BITS).rev() {
        if fraction >= step {
            fixed |= 1 << bit;
            fraction -= step;
        }
        step /= 2.0;
    }

    fixed as i16
}

/// Linear inverse of [`float_to_fixed`].
pub fn fixed_to_float(fixed: i16) -> f64 {
    f64::from(fixed) / FIXED_ONE
}

/// Aperture f-number to the camera's aperture units: `fixed(log2(f²))`.
pub fn fstop_to_units(fstop: f64) -> i16 {
    float_to_fixed((fstop * fstop).log2())
}

/// Camera aperture units back to an f-number: `sqrt(2^(units / 2048))`.
pub fn units_to_fstop(units: u16) -> f64 {
    2f64.powf(f64::from(units) / FIXED_ONE).sqrt()
}

/// Decode one packed-BCD byte (`byte - 6 * high_nibble`).
///
/// Bytes with a nibble above 9 are rejected rather than clamped.
pub fn bcd_to_int(byte: u8) -> Result<u8, CodecError> {
    if byte >> 4 > 9 || byte & 0x0F > 9 {
        return Err(CodecError::InvalidBcd(byte));
    }
    Ok(byte - 6 * (byte >> 4))
}

pub fn int_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}
