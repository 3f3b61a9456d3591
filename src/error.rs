//! Error types for package decoding.
//!
//! Every fallible operation in this crate returns [`TelemetryError`] as a value.
//! Nothing is retried internally: the codec only ever looks at an in-memory
//! buffer, so there is nothing transient to retry.
//!
//! ## Error Categories
//!
//! - **Framing**: a declared length exceeds the bytes actually available
//!   (short header, short payload, record overrun, trailing bytes)
//! - **Format mismatch**: a format-specific decoder was invoked on a package
//!   carrying another format tag
//! - **Tag**: a record tag is unknown, or differs from the tag a snapshot
//!   decoder requires
//! - **Unsupported bit width**: a sample decoder was requested for a width
//!   other than 16 or 32 bits
//! - **Virtual device**: a physical device id was treated as a virtual one
//!
//! Callers that route packages by format can match on [`TelemetryError::kind`]:
//!
//! ```rust
//! use telepack::{ErrorKind, Package, PackageFormat};
//!
//! let package = Package::new(0, 1, 0, 16, PackageFormat::Heartbeat, Vec::new());
//! let err = package.events().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::FormatMismatch);
//! ```

use thiserror::Error;

use crate::types::PackageFormat;

/// Result type alias for codec operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for codec operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Framing error in {context}: {details}")]
    Framing { context: String, details: String },

    #[error("Format mismatch: expected {expected}, found {found}")]
    FormatMismatch { expected: &'static str, found: PackageFormat },

    #[error("Unknown record tag {tag} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("Unexpected record tag {found} at offset {offset} (expected {expected})")]
    UnexpectedTag { expected: u8, found: u8, offset: usize },

    #[error("Unsupported sample width: {bits} bits per sensor")]
    UnsupportedBitWidth { bits: u8 },

    #[error("Device id {device_id} is not a virtual device id")]
    NotVirtualDevice { device_id: i32 },

    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Coarse category of a [`TelemetryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Framing,
    FormatMismatch,
    Tag,
    UnsupportedBitWidth,
    VirtualDevice,
    Io,
    Config,
}

impl TelemetryError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TelemetryError::Framing { .. } => ErrorKind::Framing,
            TelemetryError::FormatMismatch { .. } => ErrorKind::FormatMismatch,
            TelemetryError::UnknownTag { .. } => ErrorKind::Tag,
            TelemetryError::UnexpectedTag { .. } => ErrorKind::Tag,
            TelemetryError::UnsupportedBitWidth { .. } => ErrorKind::UnsupportedBitWidth,
            TelemetryError::NotVirtualDevice { .. } => ErrorKind::VirtualDevice,
            TelemetryError::Io { .. } => ErrorKind::Io,
            TelemetryError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Returns whether the error means the bytes themselves are malformed.
    ///
    /// Framing and tag errors indicate protocol desynchronization; the
    /// remaining kinds are caller or environment problems.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self.kind(), ErrorKind::Framing | ErrorKind::Tag)
    }

    /// Helper constructor for framing errors.
    pub fn framing(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Framing { context: context.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        TelemetryError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            TelemetryError::Framing {
                context: "stream reading".to_string(),
                details: err.to_string(),
            }
        } else {
            TelemetryError::Io { source: err }
        }
    }
}
