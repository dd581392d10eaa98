//! Device location-settings gate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::request::RequestDescriptor;

/// Opaque token for a platform-offered one-shot settings remedy.
///
/// The host UI hands it to the platform's native resolution flow and reports
/// the outcome back via `resume_after_settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionHandle {
    id: Uuid,
    /// Platform hint forwarded to the host resolution flow, if any
    tag: Option<String>,
}

impl ResolutionHandle {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: None,
        }
    }

    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: Some(tag.into()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

impl Default for ResolutionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of evaluating device settings against a request
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsVerdict {
    /// Settings already adequate for the requested cadence/accuracy
    Satisfied,
    /// The platform can offer the user a one-shot remedy
    Resolvable(ResolutionHandle),
    /// No resolution path exists
    Unavailable,
}

/// Platform seam for the device location-settings check.
pub trait SettingsBackend: Send {
    fn evaluate(&self, req: &RequestDescriptor) -> SettingsVerdict;
}

/// Checks device settings adequacy for a request.
pub struct SettingsGate {
    backend: Box<dyn SettingsBackend>,
}

impl SettingsGate {
    pub fn new(backend: Box<dyn SettingsBackend>) -> Self {
        Self { backend }
    }

    pub fn evaluate(&self, req: &RequestDescriptor) -> SettingsVerdict {
        self.backend.evaluate(req)
    }
}
