//! Structural pass over an event payload
//!
//! The walker splits a payload into tagged records without interpreting their
//! contents. Each record must fit in the remaining bytes; the walk stops at
//! the first unknown tag or overrun, and never resynchronizes.

use tracing::trace;

use crate::types::{EventTag, RESERVE_MODE_ENTRY_LEN};
use crate::wire::parse_u32_le;
use crate::{Result, TelemetryError};

/// One record's bytes, tag byte included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub tag: EventTag,
    /// Offset of the tag byte within the payload
    pub offset: usize,
    pub bytes: &'a [u8],
}

/// Iterator over the records of an event payload.
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug, Clone)]
pub struct EventRecords<'a> {
    payload: &'a [u8],
    position: usize,
    failed: bool,
}

impl<'a> EventRecords<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, position: 0, failed: false }
    }

    fn next_record(&mut self) -> Result<RawRecord<'a>> {
        let offset = self.position;
        let tag = EventTag::from_byte(self.payload[offset]);
        let remaining = self.payload.len() - offset;

        let base_len =
            tag.record_len().ok_or(TelemetryError::UnknownTag { tag: tag.as_byte(), offset })?;
        ensure_fits(tag, offset, base_len, remaining)?;

        let len = if tag == EventTag::ReserveModeStateChange {
            let count = parse_u32_le(self.payload, offset + 9)? as usize;
            let len = count
                .checked_mul(RESERVE_MODE_ENTRY_LEN)
                .and_then(|tail| tail.checked_add(base_len))
                .ok_or_else(|| {
                    TelemetryError::framing(
                        "Event record walking",
                        format!(
                            "Reserve-mode batch at offset {} declares {} entries",
                            offset, count
                        ),
                    )
                })?;
            ensure_fits(tag, offset, len, remaining)?;
            len
        } else {
            base_len
        };

        trace!("Event record {:?} at offset {} ({} bytes)", tag, offset, len);
        self.position += len;
        Ok(RawRecord { tag, offset, bytes: &self.payload[offset..offset + len] })
    }
}

impl<'a> Iterator for EventRecords<'a> {
    type Item = Result<RawRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.payload.len() {
            return None;
        }

        let record = self.next_record();
        self.failed = record.is_err();
        Some(record)
    }
}

fn ensure_fits(tag: EventTag, offset: usize, len: usize, remaining: usize) -> Result<()> {
    if len > remaining {
        return Err(TelemetryError::framing(
            "Event record walking",
            format!(
                "Record {:?} at offset {} needs {} bytes, only {} remain",
                tag, offset, len, remaining
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_utils::EventPayloadBuilder;

    #[test]
    fn splits_mixed_records() {
        let payload = EventPayloadBuilder::new()
            .object_state(100, 1)
            .reserve_mode_states(10, &[(1, 2), (3, 4)])
            .time_measurement()
            .failure(1, 2, true, 3)
            .build();

        let records: Vec<_> = EventRecords::new(&payload).collect::<Result<_>>().unwrap();
        let shape: Vec<_> = records.iter().map(|r| (r.tag, r.offset, r.bytes.len())).collect();

        assert_eq!(
            shape,
            vec![
                (EventTag::ObjectState, 0, 7),
                (EventTag::ReserveModeStateChange, 7, 29),
                (EventTag::TimeMeasurement, 36, 13),
                (EventTag::FailureInfo, 49, 18),
            ]
        );
    }

    #[test]
    fn empty_payload_has_no_records() {
        assert_eq!(EventRecords::new(&[]).count(), 0);
    }

    #[test]
    fn unknown_tag_stops_the_walk() {
        let mut payload = EventPayloadBuilder::new().object_state(1, 1).build();
        payload.extend_from_slice(&[0x09, 0, 0, 0]);
        payload.extend(EventPayloadBuilder::new().object_state(2, 2).build());

        let mut records = EventRecords::new(&payload);
        assert!(records.next().unwrap().is_ok());
        match records.next() {
            Some(Err(TelemetryError::UnknownTag { tag: 9, offset: 7 })) => {}
            other => panic!("Expected UnknownTag, got {:?}", other),
        }
        assert!(records.next().is_none());
    }

    #[test]
    fn truncated_record_is_framing_error() {
        let payload = EventPayloadBuilder::new().failure(1, 2, false, 3).build();
        let err = EventRecords::new(&payload[..17]).next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn batch_count_is_checked_against_remaining_bytes() {
        let mut payload = EventPayloadBuilder::new().reserve_mode_states(1, &[(1, 1)]).build();
        // Claim a second entry that is not there.
        payload[9] = 2;

        let err = EventRecords::new(&payload).next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn oversized_batch_count_is_framing_error() {
        let mut payload = EventPayloadBuilder::new().reserve_mode_states(1, &[]).build();
        payload[9..13].copy_from_slice(&u32::MAX.to_le_bytes());

        let err = EventRecords::new(&payload).next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }
}
