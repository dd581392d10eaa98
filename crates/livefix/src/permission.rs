//! Runtime permission gate.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Grant state of the location permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Platform seam for the runtime permission.
///
/// `request_grant` only triggers the host-mediated prompt; the outcome comes
/// back through the controller's `resume_after_permission`, which re-enters
/// `check`.
pub trait PermissionBackend: Send {
    fn check(&self) -> PermissionStatus;
    fn request_grant(&mut self);
}

/// Checks and solicits the single runtime permission.
///
/// A denial is terminal until the caller re-initiates the check; the gate
/// never re-prompts on its own.
pub struct PermissionGate {
    backend: Box<dyn PermissionBackend>,
}

impl PermissionGate {
    pub fn new(backend: Box<dyn PermissionBackend>) -> Self {
        Self { backend }
    }

    pub fn check(&self) -> PermissionStatus {
        self.backend.check()
    }

    /// Ask the host to present the grant prompt
    pub fn request_grant(&mut self) {
        debug!("soliciting permission grant from host");
        self.backend.request_grant();
    }
}
