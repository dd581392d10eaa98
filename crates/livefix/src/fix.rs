//! Location fixes and the stream payload built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LocationError;

/// One location sample from the sensor source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    /// Estimated horizontal accuracy radius, meters
    pub accuracy_m: f32,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    pub fn new(lat: f64, lon: f64, accuracy_m: f32) -> Self {
        Self {
            lat,
            lon,
            accuracy_m,
            timestamp: Utc::now(),
        }
    }
}

/// One emission on the update stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateResult {
    Success(Fix),
    Failure(LocationError),
}

impl UpdateResult {
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateResult::Success(_))
    }

    pub fn fix(&self) -> Option<&Fix> {
        match self {
            UpdateResult::Success(fix) => Some(fix),
            UpdateResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&LocationError> {
        match self {
            UpdateResult::Success(_) => None,
            UpdateResult::Failure(err) => Some(err),
        }
    }
}
