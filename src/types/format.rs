//! Package format tags and event record tags

use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload interpretation selected by a package's format byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageFormat {
    /// Raw sensor sample array
    Data,
    /// Event stream
    Events,
    /// Full failure-state snapshot
    FullFailureStates,
    /// Full accident-state snapshot (not decoded by this crate)
    FullAccidentStates,
    /// Full object-state snapshot
    FullObjectStates,
    /// Heartbeat, no payload semantics
    Heartbeat,
    /// Changed object states
    ChangedObjectStates,
    /// Changed failure states
    ChangedFailureStates,
    /// Changed not-responding devices (not decoded by this crate)
    ChangedNotRespondingDevices,
    Unknown(u8),
}

impl PackageFormat {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => PackageFormat::Data,
            1 => PackageFormat::Events,
            2 => PackageFormat::FullFailureStates,
            5 => PackageFormat::FullAccidentStates,
            6 => PackageFormat::FullObjectStates,
            7 => PackageFormat::Heartbeat,
            8 => PackageFormat::ChangedObjectStates,
            9 => PackageFormat::ChangedFailureStates,
            10 => PackageFormat::ChangedNotRespondingDevices,
            other => PackageFormat::Unknown(other),
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            PackageFormat::Data => 0,
            PackageFormat::Events => 1,
            PackageFormat::FullFailureStates => 2,
            PackageFormat::FullAccidentStates => 5,
            PackageFormat::FullObjectStates => 6,
            PackageFormat::Heartbeat => 7,
            PackageFormat::ChangedObjectStates => 8,
            PackageFormat::ChangedFailureStates => 9,
            PackageFormat::ChangedNotRespondingDevices => 10,
            PackageFormat::Unknown(other) => other,
        }
    }

    /// Whether the payload is a stream of tagged event records.
    pub const fn carries_events(self) -> bool {
        matches!(
            self,
            PackageFormat::Events
                | PackageFormat::ChangedObjectStates
                | PackageFormat::ChangedFailureStates
        )
    }
}

impl From<u8> for PackageFormat {
    fn from(byte: u8) -> Self {
        PackageFormat::from_byte(byte)
    }
}

impl From<PackageFormat> for u8 {
    fn from(format: PackageFormat) -> Self {
        format.as_byte()
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte())
    }
}

/// Leading tag byte of an event record.
///
/// The tag set is closed; anything outside 1..=8 is carried as `Unknown` and
/// rejected by the record walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTag {
    FailureInfo,
    TimeMeasurement,
    DeviceUnreachable,
    PrognosisStep,
    ReserveModeLeave,
    ReserveModeStateChange,
    Accident,
    ObjectState,
    Unknown(u8),
}

impl EventTag {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => EventTag::FailureInfo,
            2 => EventTag::TimeMeasurement,
            3 => EventTag::DeviceUnreachable,
            4 => EventTag::PrognosisStep,
            5 => EventTag::ReserveModeLeave,
            6 => EventTag::ReserveModeStateChange,
            7 => EventTag::Accident,
            8 => EventTag::ObjectState,
            other => EventTag::Unknown(other),
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            EventTag::FailureInfo => 1,
            EventTag::TimeMeasurement => 2,
            EventTag::DeviceUnreachable => 3,
            EventTag::PrognosisStep => 4,
            EventTag::ReserveModeLeave => 5,
            EventTag::ReserveModeStateChange => 6,
            EventTag::Accident => 7,
            EventTag::ObjectState => 8,
            EventTag::Unknown(other) => other,
        }
    }

    /// Fixed record length in bytes, tag byte included.
    ///
    /// For `ReserveModeStateChange` this is the length of an empty batch; each
    /// entry adds [`RESERVE_MODE_ENTRY_LEN`] bytes.
    pub const fn record_len(self) -> Option<usize> {
        match self {
            EventTag::FailureInfo => Some(18),
            EventTag::TimeMeasurement => Some(13),
            EventTag::DeviceUnreachable => Some(18),
            EventTag::PrognosisStep => Some(21),
            EventTag::ReserveModeLeave => Some(22),
            EventTag::ReserveModeStateChange => Some(RESERVE_MODE_HEADER_LEN),
            EventTag::Accident => Some(26),
            EventTag::ObjectState => Some(7),
            EventTag::Unknown(_) => None,
        }
    }
}

/// Length of a reserve-mode batch record with no entries.
pub const RESERVE_MODE_HEADER_LEN: usize = 13;

/// Size of one (object id, mode id) entry in a reserve-mode batch record.
pub const RESERVE_MODE_ENTRY_LEN: usize = 8;

impl From<u8> for EventTag {
    fn from(byte: u8) -> Self {
        EventTag::from_byte(byte)
    }
}
