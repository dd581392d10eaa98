//! Location request descriptors.
//!
//! A descriptor is immutable: callers replace it wholesale to start a new
//! negotiation, they never mutate one in place.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Desired accuracy/power trade-off for location updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Most precise fixes the platform can produce
    HighAccuracy,
    /// Block-level accuracy with reduced power draw
    Balanced,
    /// City-level accuracy, minimal power
    LowPower,
    /// Passive only: piggyback on fixes requested by others
    NoPower,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::HighAccuracy => write!(f, "high_accuracy"),
            Priority::Balanced => write!(f, "balanced"),
            Priority::LowPower => write!(f, "low_power"),
            Priority::NoPower => write!(f, "no_power"),
        }
    }
}

/// Desired update cadence and accuracy for one negotiation.
///
/// Invariant: `fastest_interval_ms <= interval_ms`, enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    priority: Priority,
    interval_ms: u64,
    fastest_interval_ms: u64,
}

impl RequestDescriptor {
    /// Build a descriptor, rejecting a fastest interval above the nominal one
    pub fn new(
        priority: Priority,
        interval_ms: u64,
        fastest_interval_ms: u64,
    ) -> Result<Self, RequestError> {
        if fastest_interval_ms > interval_ms {
            return Err(RequestError::FastestExceedsInterval {
                fastest_ms: fastest_interval_ms,
                interval_ms,
            });
        }
        Ok(Self {
            priority,
            interval_ms,
            fastest_interval_ms,
        })
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Nominal milliseconds between fixes
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Floor on milliseconds between fixes when others request faster updates
    pub fn fastest_interval_ms(&self) -> u64 {
        self.fastest_interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_accepts_equal_intervals() {
        let req = RequestDescriptor::new(Priority::Balanced, 2000, 2000).unwrap();
        assert_eq!(req.interval_ms(), 2000);
        assert_eq!(req.fastest_interval_ms(), 2000);
    }

    #[test]
    fn test_descriptor_rejects_inverted_intervals() {
        let err = RequestDescriptor::new(Priority::HighAccuracy, 1000, 2000).unwrap_err();
        assert_eq!(
            err,
            RequestError::FastestExceedsInterval {
                fastest_ms: 2000,
                interval_ms: 1000,
            }
        );
    }

    #[test]
    fn test_priority_serializes_snake_case() {
        let json = serde_json::to_string(&Priority::HighAccuracy).unwrap();
        assert_eq!(json, "\"high_accuracy\"");
    }
}
