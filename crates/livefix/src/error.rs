//! Error types for the negotiation pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::ResolutionHandle;

/// Failure kinds surfaced on the update stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionsRequired,
    SettingsChangeRequired,
    Unavailable,
    Cancelled,
}

/// A reported negotiation failure.
///
/// Only `SettingsChangeRequired` carries a resolution handle, and only while
/// the platform is actually offering one.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    #[error("location permission not granted")]
    PermissionsRequired,

    #[error("device location settings need a change")]
    SettingsChangeRequired {
        resolution: Option<ResolutionHandle>,
    },

    #[error("location updates unavailable")]
    Unavailable,

    #[error("location request cancelled")]
    Cancelled,
}

impl LocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LocationError::PermissionsRequired => ErrorKind::PermissionsRequired,
            LocationError::SettingsChangeRequired { .. } => ErrorKind::SettingsChangeRequired,
            LocationError::Unavailable => ErrorKind::Unavailable,
            LocationError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The platform-offered remedy, when one is on the table
    pub fn resolution(&self) -> Option<&ResolutionHandle> {
        match self {
            LocationError::SettingsChangeRequired { resolution } => resolution.as_ref(),
            _ => None,
        }
    }
}

/// Invalid request descriptor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("fastest interval {fastest_ms}ms exceeds interval {interval_ms}ms")]
    FastestExceedsInterval { fastest_ms: u64, interval_ms: u64 },
}

/// Faults reported by the sensor source when a subscription is opened
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The platform revoked or never held the permission the gates saw
    #[error("sensor source rejected the subscription: permission denied")]
    PermissionDenied,

    #[error("sensor source unavailable: {0}")]
    Unavailable(String),
}

/// Configuration file problems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] RequestError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            LocationError::PermissionsRequired.kind(),
            ErrorKind::PermissionsRequired
        );
        assert_eq!(
            LocationError::SettingsChangeRequired { resolution: None }.kind(),
            ErrorKind::SettingsChangeRequired
        );
        assert_eq!(LocationError::Unavailable.kind(), ErrorKind::Unavailable);
        assert_eq!(LocationError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_resolution_only_on_settings_errors() {
        let handle = ResolutionHandle::tagged("enable-gps");
        let err = LocationError::SettingsChangeRequired {
            resolution: Some(handle.clone()),
        };
        assert_eq!(err.resolution(), Some(&handle));
        assert_eq!(LocationError::PermissionsRequired.resolution(), None);
    }
}
