//! Payload builders for tests and benchmarks
//!
//! Wire records are tedious to write out by hand; [`EventPayloadBuilder`]
//! emits them in the exact layout the decoders expect.

#![cfg(any(test, feature = "benchmark"))]

use crate::package::Package;
use crate::types::{EventTag, PackageFormat};

/// Timestamp used by [`sample_package`], in microseconds.
pub const SAMPLE_TIMESTAMP: u64 = 1_700_000_000_000_000;

/// Builds an event payload record by record.
#[derive(Debug, Clone, Default)]
pub struct EventPayloadBuilder {
    buf: Vec<u8>,
}

impl EventPayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure(mut self, object_id: u32, failure_id: u32, started: bool, micros: u64) -> Self {
        self.tag(EventTag::FailureInfo);
        self.buf.extend_from_slice(&object_id.to_le_bytes());
        self.buf.extend_from_slice(&failure_id.to_le_bytes());
        self.buf.push(started as u8);
        self.buf.extend_from_slice(&micros.to_le_bytes());
        self
    }

    /// Reserved record, zero-filled.
    pub fn time_measurement(mut self) -> Self {
        self.zeroed(EventTag::TimeMeasurement);
        self
    }

    /// Reserved record, zero-filled.
    pub fn device_unreachable(mut self) -> Self {
        self.zeroed(EventTag::DeviceUnreachable);
        self
    }

    pub fn prognosis_step(
        mut self,
        algorithm_id: u32,
        object_id: u32,
        step: i32,
        micros: u64,
    ) -> Self {
        self.tag(EventTag::PrognosisStep);
        self.buf.extend_from_slice(&algorithm_id.to_le_bytes());
        self.buf.extend_from_slice(&object_id.to_le_bytes());
        self.buf.extend_from_slice(&step.to_le_bytes());
        self.buf.extend_from_slice(&micros.to_le_bytes());
        self
    }

    pub fn reserve_mode_leave(
        mut self,
        object_id: u32,
        algorithm_id: u32,
        state_id: i32,
        leaving: bool,
        micros: u64,
    ) -> Self {
        self.tag(EventTag::ReserveModeLeave);
        self.buf.extend_from_slice(&object_id.to_le_bytes());
        self.buf.extend_from_slice(&algorithm_id.to_le_bytes());
        self.buf.extend_from_slice(&state_id.to_le_bytes());
        self.buf.push(leaving as u8);
        self.buf.extend_from_slice(&micros.to_le_bytes());
        self
    }

    /// Batch record; `entries` are (object id, state id) pairs.
    pub fn reserve_mode_states(mut self, micros: u64, entries: &[(u32, i32)]) -> Self {
        self.tag(EventTag::ReserveModeStateChange);
        self.buf.extend_from_slice(&micros.to_le_bytes());
        self.buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for (object_id, state_id) in entries {
            self.buf.extend_from_slice(&object_id.to_le_bytes());
            self.buf.extend_from_slice(&state_id.to_le_bytes());
        }
        self
    }

    /// Accident record; an `end_micros` of zero leaves the episode open.
    pub fn accident(
        mut self,
        kind: u8,
        algorithm_id: i32,
        object_id: u32,
        start_micros: u64,
        end_micros: u64,
    ) -> Self {
        self.tag(EventTag::Accident);
        self.buf.push(kind);
        self.buf.extend_from_slice(&algorithm_id.to_le_bytes());
        self.buf.extend_from_slice(&object_id.to_le_bytes());
        self.buf.extend_from_slice(&start_micros.to_le_bytes());
        self.buf.extend_from_slice(&end_micros.to_le_bytes());
        self
    }

    pub fn object_state(mut self, object_id: u32, state: u16) -> Self {
        self.tag(EventTag::ObjectState);
        self.buf.extend_from_slice(&object_id.to_le_bytes());
        self.buf.extend_from_slice(&state.to_le_bytes());
        self
    }

    /// Append arbitrary bytes, e.g. to corrupt a payload.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    fn tag(&mut self, tag: EventTag) {
        self.buf.push(tag.as_byte());
    }

    fn zeroed(&mut self, tag: EventTag) {
        let len = tag.record_len().unwrap_or(1);
        self.tag(tag);
        self.buf.resize(self.buf.len() + len - 1, 0);
    }
}

/// A package from device 1 at [`SAMPLE_TIMESTAMP`].
///
/// The header declares 16-bit sensors, one per two payload bytes.
pub fn sample_package(format: PackageFormat, payload: Vec<u8>) -> Package {
    let sensor_count = (payload.len() / 2) as u16;
    Package::new(SAMPLE_TIMESTAMP, 1, sensor_count, 16, format, payload)
}

/// An event payload touching every record kind, repeated over `objects`
/// distinct object ids.
pub fn mixed_event_payload(objects: u32) -> Vec<u8> {
    let batch: Vec<(u32, i32)> = (0..objects).map(|object| (object, 1)).collect();
    (0..objects)
        .fold(EventPayloadBuilder::new(), |builder, object| {
            let micros = SAMPLE_TIMESTAMP + object as u64;
            builder
                .object_state(object, (object % 7) as u16)
                .failure(object, object % 3, object % 2 == 0, micros)
                .accident(2, 5, object, micros, 0)
                .prognosis_step(9, object, 1, micros)
                .reserve_mode_leave(object, 4, 2, true, micros)
                .time_measurement()
        })
        .reserve_mode_states(SAMPLE_TIMESTAMP, &batch)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_have_wire_lengths() {
        let cases = [
            (EventPayloadBuilder::new().failure(1, 2, true, 3).build(), EventTag::FailureInfo),
            (EventPayloadBuilder::new().time_measurement().build(), EventTag::TimeMeasurement),
            (EventPayloadBuilder::new().device_unreachable().build(), EventTag::DeviceUnreachable),
            (
                EventPayloadBuilder::new().prognosis_step(1, 2, 3, 4).build(),
                EventTag::PrognosisStep,
            ),
            (
                EventPayloadBuilder::new().reserve_mode_leave(1, 2, 3, true, 4).build(),
                EventTag::ReserveModeLeave,
            ),
            (
                EventPayloadBuilder::new().reserve_mode_states(1, &[]).build(),
                EventTag::ReserveModeStateChange,
            ),
            (EventPayloadBuilder::new().accident(1, 2, 3, 4, 5).build(), EventTag::Accident),
            (EventPayloadBuilder::new().object_state(1, 2).build(), EventTag::ObjectState),
        ];

        for (payload, tag) in cases {
            assert_eq!(payload[0], tag.as_byte());
            assert_eq!(Some(payload.len()), tag.record_len(), "{:?}", tag);
        }
    }

    #[test]
    fn mixed_payload_decodes() {
        let payload = mixed_event_payload(10);
        let events = crate::PackageEvents::parse(PackageFormat::Events, &payload).unwrap();
        assert_eq!(events.objects().len(), 10);
        assert_eq!(events.reserve_mode_states.len(), 10);
    }
}
