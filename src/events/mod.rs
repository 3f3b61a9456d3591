//! Event stream demultiplexing
//!
//! An event payload is a concatenation of tagged records. Decoding happens in
//! two passes over the same bytes:
//!
//! 1. [`EventRecords`] walks the payload and yields one [`RawRecord`] per tag,
//!    checking that each record fits in what remains.
//! 2. [`EventRecord::decode`] turns a raw record into a typed value, and
//!    [`PackageEvents`] folds those into last-write-wins maps.
//!
//! ```
//! use telepack::{PackageEvents, PackageFormat};
//!
//! let payload = [8, 100, 0, 0, 0, 1, 0, 8, 200, 0, 0, 0, 1, 0];
//! let events = PackageEvents::parse(PackageFormat::Events, &payload).unwrap();
//! assert_eq!(events.object_states.get(&100), Some(&1));
//! assert_eq!(events.objects().len(), 2);
//! ```

mod aggregate;
mod records;
mod walker;

pub use aggregate::PackageEvents;
pub use records::{
    AccidentEvent, AccidentKey, AccidentKind, EventRecord, FailureEvent, FailureKey,
    PrognosisEvent, ReserveModeLeaveEvent, ReserveModeStateEvent,
};
pub use walker::{EventRecords, RawRecord};

pub(crate) use records::{decode_failure, decode_object_state};
