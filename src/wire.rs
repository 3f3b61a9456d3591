//! Bounds-checked little-endian field readers.
//!
//! Every reader takes the full buffer and an absolute offset, and reports a
//! framing error instead of panicking when the field does not fit.

use crate::{Result, TelemetryError};

fn field<const N: usize>(data: &[u8], offset: usize, what: &str) -> Result<[u8; N]> {
    data.get(offset..offset.saturating_add(N))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| {
            TelemetryError::framing(
                format!("{} parsing", what),
                format!(
                    "Insufficient data at offset {} (need {} bytes, have {})",
                    offset,
                    N,
                    data.len().saturating_sub(offset)
                ),
            )
        })
}

pub(crate) fn parse_u8(data: &[u8], offset: usize) -> Result<u8> {
    Ok(field::<1>(data, offset, "Byte")?[0])
}

pub(crate) fn parse_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    field(data, offset, "Short integer").map(u16::from_le_bytes)
}

pub(crate) fn parse_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    field(data, offset, "Integer").map(u32::from_le_bytes)
}

pub(crate) fn parse_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    field(data, offset, "Integer").map(i32::from_le_bytes)
}

pub(crate) fn parse_u64_le(data: &[u8], offset: usize) -> Result<u64> {
    field(data, offset, "Long integer").map(u64::from_le_bytes)
}
