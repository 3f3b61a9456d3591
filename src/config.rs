//! YAML configuration for codec limits and logging.
//!
//! Every field has a default, so a partial document (or an empty one) is a
//! valid configuration:
//!
//! ```yaml
//! codec:
//!   max_payload_len: 4096
//! logging:
//!   filter: "telepack=debug"
//!   ansi: false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::package::MAX_PAYLOAD_LEN;
use crate::{Result, TelemetryError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub codec: CodecConfig,
    pub logging: LoggingConfig,
}

/// Limits applied by the streaming framers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Frames declaring a longer payload are rejected
    pub max_payload_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self { max_payload_len: MAX_PAYLOAD_LEN }
    }
}

/// Subscriber settings used by [`crate::logging::init`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` or `info` when unset
    pub filter: Option<String>,
    pub with_target: bool,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: None, with_target: true, ansi: true }
    }
}

impl Config {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml_ng::from_str(yaml)
            .map_err(|e| TelemetryError::config(format!("YAML parsing failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| {
            TelemetryError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.codec.max_payload_len == 0 {
            return Err(TelemetryError::config("codec.max_payload_len must be greater than zero"));
        }
        Ok(())
    }
}
