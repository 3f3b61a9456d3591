//! Full-state snapshot decoders
//!
//! Snapshot payloads are arrays of fixed-size records that all carry the same
//! tag. Any length or tag irregularity rejects the whole payload.

use std::collections::HashMap;

use tracing::debug;

use crate::events::{FailureEvent, FailureKey, decode_failure, decode_object_state};
use crate::types::{EventTag, PackageFormat};
use crate::{Result, TelemetryError};

/// Object id to state code.
pub type ObjectStates = HashMap<u32, u16>;

/// Latest failure event per (object, failure) pair.
pub type FailureStates = HashMap<FailureKey, FailureEvent>;

pub fn parse_full_object_states(format: PackageFormat, payload: &[u8]) -> Result<ObjectStates> {
    let records = snapshot_records(
        format,
        PackageFormat::FullObjectStates,
        "full object-state snapshot",
        EventTag::ObjectState,
        payload,
    )?;

    let states = records
        .map(decode_object_state)
        .collect::<Result<ObjectStates>>()?;
    debug!("Decoded full object-state snapshot: {} objects", states.len());
    Ok(states)
}

pub fn parse_full_failure_states(format: PackageFormat, payload: &[u8]) -> Result<FailureStates> {
    let records = snapshot_records(
        format,
        PackageFormat::FullFailureStates,
        "full failure-state snapshot",
        EventTag::FailureInfo,
        payload,
    )?;

    let failures = records
        .map(|record| decode_failure(record).map(|event| (event.key(), event)))
        .collect::<Result<FailureStates>>()?;
    debug!("Decoded full failure-state snapshot: {} failures", failures.len());
    Ok(failures)
}

/// Validate a snapshot payload and split it into records.
///
/// Every record is tag-checked before any is decoded.
fn snapshot_records<'a>(
    format: PackageFormat,
    expected_format: PackageFormat,
    description: &'static str,
    tag: EventTag,
    payload: &'a [u8],
) -> Result<std::slice::ChunksExact<'a, u8>> {
    if format != expected_format {
        return Err(TelemetryError::FormatMismatch { expected: description, found: format });
    }

    let record_len =
        tag.record_len().ok_or(TelemetryError::UnknownTag { tag: tag.as_byte(), offset: 0 })?;
    if payload.len() % record_len != 0 {
        return Err(TelemetryError::framing(
            "Snapshot decoding",
            format!(
                "{} bytes is not a multiple of the {}-byte {:?} record",
                payload.len(),
                record_len,
                tag
            ),
        ));
    }

    let records = payload.chunks_exact(record_len);
    for (index, record) in records.clone().enumerate() {
        if record[0] != tag.as_byte() {
            return Err(TelemetryError::UnexpectedTag {
                expected: tag.as_byte(),
                found: record[0],
                offset: index * record_len,
            });
        }
    }

    Ok(records)
}
