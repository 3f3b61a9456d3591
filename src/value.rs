//! Fixed-point sensor value decoding.
//!
//! Sensor samples travel as 16- or 32-bit unsigned integers holding the
//! reading in thousandths. A width-specific sentinel marks "no reading" and
//! decodes to NaN. Negative readings are recovered by complementing the raw
//! value and adding one, then negating the magnitude.
//!
//! ```rust
//! use telepack::value::{decode_u32, sample_decoder};
//!
//! assert_eq!(decode_u32(1500), 1.5);
//! assert_eq!(decode_u32(0xFFFF_FC18), -1.0);
//! assert!(decode_u32(0x8000_0000).is_nan());
//!
//! let decode = sample_decoder(16).unwrap();
//! assert_eq!(decode(&[0xFF, 0x00, 0x01, 0x00], 1), 0.001);
//! assert!(decode(&[0xFF, 0x00], 1).is_nan());
//! ```

use crate::{Result, TelemetryError};

/// "No reading" sentinel for 16-bit samples.
pub const UNDEFINED_16: u16 = 0x8000;

/// "No reading" sentinel for 32-bit samples.
pub const UNDEFINED_32: u32 = 0x8000_0000;

const UNDEFINED_MEASURE_BITS: u32 = 0xFFFF_FFFF;

/// Decodes the sample at a zero-based sensor index from a payload slice.
pub type SampleDecoder = fn(&[u8], u16) -> f32;

/// NaN value used for undefined and unavailable readings.
pub fn undefined_value() -> f32 {
    f32::from_bits(UNDEFINED_MEASURE_BITS)
}

pub fn is_undefined(value: f32) -> bool {
    value.is_nan()
}

pub fn decode_u32(raw: u32) -> f32 {
    if raw == UNDEFINED_32 {
        return undefined_value();
    }

    let negative = raw & 0x8000_0000 != 0;
    let magnitude = if negative { (!raw).wrapping_add(1) } else { raw };

    let value = (magnitude / 1000) as f32 + (magnitude % 1000) as f32 * 0.001;
    round3(if negative { -value } else { value })
}

pub fn decode_u16(raw: u16) -> f32 {
    if raw == UNDEFINED_16 {
        return undefined_value();
    }

    let negative = raw & 0x8000 != 0;
    let magnitude = if negative { (!raw).wrapping_add(1) } else { raw };

    let value = (magnitude / 1000) as f32 + (magnitude % 1000) as f32 * 0.001;
    round3(if negative { -value } else { value })
}

// Scaling happens in single precision, rounding in double.
fn round3(value: f32) -> f32 {
    (((value * 1000.0) as f64).round() / 1000.0) as f32
}

/// Select the sample decoder for a declared bit width.
///
/// Only 16 and 32 bits per sensor decode to physical values.
pub fn sample_decoder(bits_per_sensor: u8) -> Result<SampleDecoder> {
    match bits_per_sensor {
        16 => Ok(sample_16),
        32 => Ok(sample_32),
        bits => Err(TelemetryError::UnsupportedBitWidth { bits }),
    }
}

fn sample_16(data: &[u8], sensor: u16) -> f32 {
    data.chunks_exact(2)
        .nth(sensor as usize)
        .map_or_else(undefined_value, |b| decode_u16(u16::from_le_bytes([b[0], b[1]])))
}

fn sample_32(data: &[u8], sensor: u16) -> f32 {
    data.chunks_exact(4)
        .nth(sensor as usize)
        .map_or_else(undefined_value, |b| decode_u32(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
}
