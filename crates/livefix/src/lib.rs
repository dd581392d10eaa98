//! Livefix - location-update negotiation pipeline.
//!
//! Turns a location-request configuration into a stream of
//! location-or-error results. Permission and settings deficiencies halt the
//! pipeline and are reported upward; the host UI resolves them and resumes
//! the negotiation through explicit inbound calls.
//!
//! The platform is reached only through three seams: [`PermissionBackend`],
//! [`SettingsBackend`] and [`SensorSource`]. Everything else is
//! platform-independent and serialized on a single logical owner.

pub mod binding;
pub mod config;
pub mod controller;
pub mod error;
pub mod fix;
pub mod permission;
pub mod request;
pub mod sensor;
pub mod service;
pub mod session;
pub mod settings;

pub use binding::ReactiveBinding;
pub use config::UpdateConfig;
pub use controller::{NegotiationController, NegotiationState};
pub use error::{ErrorKind, LocationError, RequestError, SensorError};
pub use fix::{Fix, UpdateResult};
pub use permission::{PermissionBackend, PermissionStatus};
pub use request::{Priority, RequestDescriptor};
pub use sensor::{SensorEvent, SensorSink, SensorSource, SubscriptionId};
pub use service::{spawn, LiveFixHandle};
pub use settings::{ResolutionHandle, SettingsBackend, SettingsVerdict};
