//! Structured event records and their wire decoders
//!
//! Offsets below are relative to the record start; byte 0 is always the tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::walker::RawRecord;
use crate::time::time_from_micros;
use crate::types::{EventTag, RESERVE_MODE_ENTRY_LEN, RESERVE_MODE_HEADER_LEN};
use crate::wire::{parse_i32_le, parse_u8, parse_u16_le, parse_u32_le, parse_u64_le};
use crate::{Result, TelemetryError};

/// Identity of one failure on one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FailureKey {
    pub object_id: u32,
    pub failure_id: u32,
}

/// Identity of one accident stream on one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccidentKey {
    pub object_id: u32,
    pub algorithm_id: i32,
}

/// A failure starting or ending on an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEvent {
    pub object_id: u32,
    pub failure_id: u32,
    pub is_started: bool,
    pub time: DateTime<Utc>,
}

impl FailureEvent {
    pub fn key(&self) -> FailureKey {
        FailureKey { object_id: self.object_id, failure_id: self.failure_id }
    }
}

/// Progress of a failure prognosis algorithm on an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrognosisEvent {
    pub algorithm_id: u32,
    pub object_id: u32,
    pub step_index: i32,
    pub time: DateTime<Utc>,
}

/// An object leaving or returning to a reserve-mode state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveModeLeaveEvent {
    pub object_id: u32,
    pub algorithm_id: u32,
    /// State being left when `is_leaving`, otherwise the state returned to
    pub state_id: i32,
    pub is_leaving: bool,
    pub time: DateTime<Utc>,
}

/// Reserve-mode state assigned to an object by a batch record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveModeStateEvent {
    pub object_id: u32,
    pub state_id: i32,
    pub time: DateTime<Utc>,
}

/// Cause of an accident episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccidentKind {
    /// Object left reserve mode; the algorithm id is -1
    ReserveModeExit,
    /// An emergency automation algorithm fired
    AlgorithmTriggered,
    Unknown(u8),
}

impl AccidentKind {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => AccidentKind::ReserveModeExit,
            2 => AccidentKind::AlgorithmTriggered,
            other => AccidentKind::Unknown(other),
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            AccidentKind::ReserveModeExit => 1,
            AccidentKind::AlgorithmTriggered => 2,
            AccidentKind::Unknown(other) => other,
        }
    }
}

/// A bounded episode of abnormal operation on an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentEvent {
    pub object_id: u32,
    pub kind: AccidentKind,
    pub algorithm_id: i32,
    pub start_time: DateTime<Utc>,
    /// `None` while the episode is still open
    pub end_time: Option<DateTime<Utc>>,
}

impl AccidentEvent {
    pub fn key(&self) -> AccidentKey {
        AccidentKey { object_id: self.object_id, algorithm_id: self.algorithm_id }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// One decoded event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventRecord {
    Failure(FailureEvent),
    /// Reserved; carried but not decoded
    TimeMeasurement,
    /// Reserved; carried but not decoded
    DeviceUnreachable,
    PrognosisStep(PrognosisEvent),
    ReserveModeLeave(ReserveModeLeaveEvent),
    /// Batch of reserve-mode states sharing one timestamp
    ReserveModeStates(Vec<ReserveModeStateEvent>),
    Accident(AccidentEvent),
    ObjectState { object_id: u32, state: u16 },
}

impl EventRecord {
    /// Decode a structurally validated record.
    pub fn decode(raw: &RawRecord<'_>) -> Result<Self> {
        let bytes = raw.bytes;
        let record = match raw.tag {
            EventTag::FailureInfo => EventRecord::Failure(decode_failure(bytes)?),
            EventTag::TimeMeasurement => EventRecord::TimeMeasurement,
            EventTag::DeviceUnreachable => EventRecord::DeviceUnreachable,
            EventTag::PrognosisStep => EventRecord::PrognosisStep(PrognosisEvent {
                algorithm_id: parse_u32_le(bytes, 1)?,
                object_id: parse_u32_le(bytes, 5)?,
                step_index: parse_i32_le(bytes, 9)?,
                time: time_from_micros(parse_u64_le(bytes, 13)?),
            }),
            EventTag::ReserveModeLeave => EventRecord::ReserveModeLeave(ReserveModeLeaveEvent {
                object_id: parse_u32_le(bytes, 1)?,
                algorithm_id: parse_u32_le(bytes, 5)?,
                state_id: parse_i32_le(bytes, 9)?,
                is_leaving: parse_u8(bytes, 13)? != 0,
                time: time_from_micros(parse_u64_le(bytes, 14)?),
            }),
            EventTag::ReserveModeStateChange => {
                EventRecord::ReserveModeStates(decode_reserve_mode_states(bytes)?)
            }
            EventTag::Accident => {
                let end_micros = parse_u64_le(bytes, 18)?;
                EventRecord::Accident(AccidentEvent {
                    kind: AccidentKind::from_byte(parse_u8(bytes, 1)?),
                    algorithm_id: parse_i32_le(bytes, 2)?,
                    object_id: parse_u32_le(bytes, 6)?,
                    start_time: time_from_micros(parse_u64_le(bytes, 10)?),
                    end_time: (end_micros != 0).then(|| time_from_micros(end_micros)),
                })
            }
            EventTag::ObjectState => {
                let (object_id, state) = decode_object_state(bytes)?;
                EventRecord::ObjectState { object_id, state }
            }
            EventTag::Unknown(tag) => {
                return Err(TelemetryError::UnknownTag { tag, offset: raw.offset });
            }
        };
        Ok(record)
    }

    pub fn tag(&self) -> EventTag {
        match self {
            EventRecord::Failure(_) => EventTag::FailureInfo,
            EventRecord::TimeMeasurement => EventTag::TimeMeasurement,
            EventRecord::DeviceUnreachable => EventTag::DeviceUnreachable,
            EventRecord::PrognosisStep(_) => EventTag::PrognosisStep,
            EventRecord::ReserveModeLeave(_) => EventTag::ReserveModeLeave,
            EventRecord::ReserveModeStates(_) => EventTag::ReserveModeStateChange,
            EventRecord::Accident(_) => EventTag::Accident,
            EventRecord::ObjectState { .. } => EventTag::ObjectState,
        }
    }
}

pub(crate) fn decode_failure(bytes: &[u8]) -> Result<FailureEvent> {
    Ok(FailureEvent {
        object_id: parse_u32_le(bytes, 1)?,
        failure_id: parse_u32_le(bytes, 5)?,
        is_started: parse_u8(bytes, 9)? != 0,
        time: time_from_micros(parse_u64_le(bytes, 10)?),
    })
}

pub(crate) fn decode_object_state(bytes: &[u8]) -> Result<(u32, u16)> {
    Ok((parse_u32_le(bytes, 1)?, parse_u16_le(bytes, 5)?))
}

fn decode_reserve_mode_states(bytes: &[u8]) -> Result<Vec<ReserveModeStateEvent>> {
    let time = time_from_micros(parse_u64_le(bytes, 1)?);
    let count = parse_u32_le(bytes, 9)? as usize;

    (0..count)
        .map(|i| {
            let offset = RESERVE_MODE_HEADER_LEN + i * RESERVE_MODE_ENTRY_LEN;
            Ok(ReserveModeStateEvent {
                object_id: parse_u32_le(bytes, offset)?,
                state_id: parse_i32_le(bytes, offset + 4)?,
                time,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::EventPayloadBuilder;
    use crate::time::micros_from_time;

    fn decode_single(payload: &[u8]) -> EventRecord {
        let raw = RawRecord { tag: EventTag::from_byte(payload[0]), offset: 0, bytes: payload };
        EventRecord::decode(&raw).unwrap()
    }

    #[test]
    fn object_state_fields() {
        assert_eq!(decode_object_state(&[8, 100, 0, 0, 0, 200, 0]).unwrap(), (100, 200));
        assert_eq!(decode_object_state(&[8, 2, 0, 0, 0, 1, 0]).unwrap(), (2, 1));
    }

    #[test]
    fn failure_record_fields() {
        let payload = EventPayloadBuilder::new().failure(10, 20, true, 1_000_000).build();
        match decode_single(&payload) {
            EventRecord::Failure(event) => {
                assert_eq!(event.key(), FailureKey { object_id: 10, failure_id: 20 });
                assert!(event.is_started);
                assert_eq!(micros_from_time(&event.time), 1_000_000);
            }
            other => panic!("Expected failure record, got {:?}", other),
        }
    }

    #[test]
    fn prognosis_record_puts_algorithm_first() {
        let payload = EventPayloadBuilder::new().prognosis_step(7, 300, -2, 42).build();
        match decode_single(&payload) {
            EventRecord::PrognosisStep(event) => {
                assert_eq!(event.algorithm_id, 7);
                assert_eq!(event.object_id, 300);
                assert_eq!(event.step_index, -2);
                assert_eq!(micros_from_time(&event.time), 42);
            }
            other => panic!("Expected prognosis record, got {:?}", other),
        }
    }

    #[test]
    fn reserve_mode_leave_fields() {
        let payload = EventPayloadBuilder::new().reserve_mode_leave(5, 6, -1, false, 99).build();
        match decode_single(&payload) {
            EventRecord::ReserveModeLeave(event) => {
                assert_eq!(event.object_id, 5);
                assert_eq!(event.algorithm_id, 6);
                assert_eq!(event.state_id, -1);
                assert!(!event.is_leaving);
            }
            other => panic!("Expected reserve-mode leave record, got {:?}", other),
        }
    }

    #[test]
    fn accident_with_zero_end_is_open() {
        let payload = EventPayloadBuilder::new()
            .accident(1, -1, 77, 1_000, 0)
            .accident(2, 12, 77, 1_000, 2_000)
            .build();

        match decode_single(&payload[..26]) {
            EventRecord::Accident(event) => {
                assert_eq!(event.kind, AccidentKind::ReserveModeExit);
                assert_eq!(event.key(), AccidentKey { object_id: 77, algorithm_id: -1 });
                assert!(event.is_open());
            }
            other => panic!("Expected accident record, got {:?}", other),
        }

        match decode_single(&payload[26..]) {
            EventRecord::Accident(event) => {
                assert_eq!(event.kind, AccidentKind::AlgorithmTriggered);
                assert_eq!(event.end_time.map(|t| micros_from_time(&t)), Some(2_000));
            }
            other => panic!("Expected accident record, got {:?}", other),
        }
    }

    #[test]
    fn reserve_mode_batch_shares_timestamp() {
        let payload =
            EventPayloadBuilder::new().reserve_mode_states(555, &[(100, 23), (200, -1)]).build();
        match decode_single(&payload) {
            EventRecord::ReserveModeStates(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!((entries[0].object_id, entries[0].state_id), (100, 23));
                assert_eq!((entries[1].object_id, entries[1].state_id), (200, -1));
                assert!(entries.iter().all(|e| micros_from_time(&e.time) == 555));
            }
            other => panic!("Expected reserve-mode batch, got {:?}", other),
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let raw = RawRecord { tag: EventTag::Unknown(9), offset: 3, bytes: &[9] };
        match EventRecord::decode(&raw) {
            Err(TelemetryError::UnknownTag { tag: 9, offset: 3 }) => {}
            other => panic!("Expected UnknownTag, got {:?}", other),
        }
    }

    #[test]
    fn accident_kind_byte_is_preserved() {
        for byte in 0..=u8::MAX {
            assert_eq!(AccidentKind::from_byte(byte).as_byte(), byte);
        }
    }
}
