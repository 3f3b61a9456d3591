//! Codec and event-stream interpreter for framed industrial telemetry.
//!
//! Telepack turns raw bytes from monitoring devices into typed packages and
//! decodes their payloads: sensor samples in a fixed-point encoding, event
//! streams aggregated into last-known-state maps, and full-state snapshots.
//!
//! # Features
//!
//! - **Framing**: [`Package`] and [`NetworkPackage`] parse from slices or
//!   readers, and [`PackageCodec`] / [`NetworkPackageCodec`] frame async streams
//! - **Events**: [`PackageEvents`] demultiplexes tagged records with strict
//!   structural validation
//! - **Samples**: 16 and 32-bit fixed-point readings with NaN for undefined
//!   or missing values
//! - **No I/O**: the codec works on in-memory buffers only; transport and
//!   subscriber setup belong to the application
//!
//! # Quick Start
//!
//! ```rust
//! use telepack::{Package, PackageFormat};
//!
//! # fn main() -> telepack::Result<()> {
//! let payload = vec![8, 100, 0, 0, 0, 1, 0];
//! let bytes = Package::new(1_700_000_000_000_000, 5, 0, 16, PackageFormat::Events, payload)
//!     .to_bytes()?;
//!
//! let package = Package::from_bytes(&bytes)?;
//! let events = package.events()?;
//! assert_eq!(events.object_states.get(&100), Some(&1));
//! # Ok(())
//! # }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod time;
pub mod types;
pub mod value;
mod wire;

// Framing and payload decoding
pub mod codec;
pub mod envelope;
pub mod events;
pub mod package;
pub mod snapshot;

// Application wiring
pub mod config;
pub mod logging;

// Core exports
pub use error::*;
pub use types::*;

pub use codec::{NetworkPackageCodec, PackageCodec};
pub use config::{CodecConfig, Config, LoggingConfig};
pub use envelope::NetworkPackage;
pub use events::{
    AccidentEvent, AccidentKey, AccidentKind, EventRecord, EventRecords, FailureEvent, FailureKey,
    PackageEvents, PrognosisEvent, RawRecord, ReserveModeLeaveEvent, ReserveModeStateEvent,
};
pub use package::{Package, PackageHeader};
pub use snapshot::{FailureStates, ObjectStates};
pub use value::{is_undefined, sample_decoder, undefined_value};
