//! Last-known-state aggregate built from an event payload

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::records::{
    AccidentEvent, AccidentKey, EventRecord, FailureEvent, FailureKey, PrognosisEvent,
    ReserveModeLeaveEvent, ReserveModeStateEvent,
};
use super::walker::EventRecords;
use crate::types::{EventTag, PackageFormat};
use crate::{Result, TelemetryError};

/// Decoded event state of one payload.
///
/// Each map keeps the last record seen for its key; nothing is merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEvents {
    pub object_states: HashMap<u32, u16>,
    pub failures: HashMap<FailureKey, FailureEvent>,
    pub accidents: HashMap<AccidentKey, AccidentEvent>,
    pub prognosis: HashMap<u32, PrognosisEvent>,
    pub reserve_mode_transitions: HashMap<u32, ReserveModeLeaveEvent>,
    pub reserve_mode_states: HashMap<u32, ReserveModeStateEvent>,
}

impl PackageEvents {
    /// Decode an event-bearing payload.
    ///
    /// `format` must be one of the event formats. When the format byte equals
    /// the object-state record tag, only object-state records are decoded;
    /// every other record is still walked and validated.
    ///
    /// On error no partial aggregate is returned.
    pub fn parse(format: PackageFormat, payload: &[u8]) -> Result<Self> {
        if !format.carries_events() {
            return Err(TelemetryError::FormatMismatch {
                expected: "event stream",
                found: format,
            });
        }

        let object_states_only = format.as_byte() == EventTag::ObjectState.as_byte();
        let mut events = PackageEvents::default();
        let mut record_count = 0usize;

        for raw in EventRecords::new(payload) {
            let raw = raw?;
            record_count += 1;
            if object_states_only && raw.tag != EventTag::ObjectState {
                continue;
            }
            events.apply(EventRecord::decode(&raw)?);
        }

        debug!(
            "Decoded {} event records from {} bytes (format {}): {} objects",
            record_count,
            payload.len(),
            format,
            events.objects().len()
        );

        Ok(events)
    }

    /// Fold one record into the aggregate, replacing any earlier entry with
    /// the same key.
    pub fn apply(&mut self, record: EventRecord) {
        match record {
            EventRecord::Failure(event) => {
                self.failures.insert(event.key(), event);
            }
            EventRecord::PrognosisStep(event) => {
                self.prognosis.insert(event.object_id, event);
            }
            EventRecord::ReserveModeLeave(event) => {
                self.reserve_mode_transitions.insert(event.object_id, event);
            }
            EventRecord::ReserveModeStates(entries) => {
                self.reserve_mode_states
                    .extend(entries.into_iter().map(|entry| (entry.object_id, entry)));
            }
            EventRecord::Accident(event) => {
                self.accidents.insert(event.key(), event);
            }
            EventRecord::ObjectState { object_id, state } => {
                self.object_states.insert(object_id, state);
            }
            EventRecord::TimeMeasurement | EventRecord::DeviceUnreachable => {}
        }
    }

    /// Every object id referenced by any of the maps.
    pub fn objects(&self) -> HashSet<u32> {
        self.object_states
            .keys()
            .copied()
            .chain(self.failures.keys().map(|key| key.object_id))
            .chain(self.accidents.keys().map(|key| key.object_id))
            .chain(self.prognosis.keys().copied())
            .chain(self.reserve_mode_transitions.keys().copied())
            .chain(self.reserve_mode_states.keys().copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.object_states.is_empty()
            && self.failures.is_empty()
            && self.accidents.is_empty()
            && self.prognosis.is_empty()
            && self.reserve_mode_transitions.is_empty()
            && self.reserve_mode_states.is_empty()
    }
}
