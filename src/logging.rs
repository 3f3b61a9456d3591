//! Subscriber setup for applications embedding the codec.
//!
//! The codec itself only emits `tracing` events; nothing in this crate calls
//! [`init`] on its own.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{Result, TelemetryError};

const DEFAULT_FILTER: &str = "info";

/// Install a global `fmt` subscriber.
///
/// The configured filter wins over `RUST_LOG`; with neither set, `info` is
/// used. Fails if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|e| TelemetryError::config(format!("Failed to install subscriber: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match config.filter.as_deref() {
        Some(directive) => EnvFilter::try_new(directive).map_err(|e| {
            TelemetryError::config(format!("Invalid log filter '{}': {}", directive, e))
        }),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}
