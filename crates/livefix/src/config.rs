//! Update configuration file.
//!
//! Supplies the default request cadence when the consumer gives none.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::request::{Priority, RequestDescriptor};

/// Defaults for building a request descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    pub priority: Priority,
    pub interval_ms: u64,
    pub fastest_interval_ms: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            priority: Priority::HighAccuracy,
            interval_ms: 2000,
            fastest_interval_ms: 1000,
        }
    }
}

impl UpdateConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from a TOML file, falling back to defaults when it is absent
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Build the descriptor these defaults describe
    pub fn descriptor(&self) -> Result<RequestDescriptor, ConfigError> {
        Ok(RequestDescriptor::new(
            self.priority,
            self.interval_ms,
            self.fastest_interval_ms,
        )?)
    }
}
