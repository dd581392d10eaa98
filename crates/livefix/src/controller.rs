//! Negotiation state machine.
//!
//! Orchestrates the permission gate, the settings gate, and the update
//! session for the active request descriptor, and emits results on a single
//! stream. All transitions run on one logical owner; asynchronous outcomes
//! re-enter through the `resume_*` calls and `on_sensor_event`.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{LocationError, SensorError};
use crate::fix::UpdateResult;
use crate::permission::{PermissionGate, PermissionStatus};
use crate::request::RequestDescriptor;
use crate::sensor::SensorEvent;
use crate::session::UpdateSession;
use crate::settings::{SettingsGate, SettingsVerdict};

/// Negotiation progress for the active request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// No request in flight
    Idle,
    /// Consulting the permission gate
    CheckingPermission,
    /// Consulting the settings gate
    CheckingSettings,
    /// Update session live, fixes flowing
    Streaming,
    /// Permission denied; waiting for an explicit resume
    PermissionBlocked,
    /// Settings deficient; waiting for the resolution outcome
    SettingsBlocked,
}

impl std::fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegotiationState::Idle => write!(f, "idle"),
            NegotiationState::CheckingPermission => write!(f, "checking_permission"),
            NegotiationState::CheckingSettings => write!(f, "checking_settings"),
            NegotiationState::Streaming => write!(f, "streaming"),
            NegotiationState::PermissionBlocked => write!(f, "permission_blocked"),
            NegotiationState::SettingsBlocked => write!(f, "settings_blocked"),
        }
    }
}

/// Orchestrates gates and session per active request descriptor.
///
/// The controller is explicitly constructed and owned; its lifetime is bound
/// to whatever component needs location updates. There is no process-wide
/// accessor.
pub struct NegotiationController {
    permission: PermissionGate,
    settings: SettingsGate,
    session: UpdateSession,
    state: NegotiationState,
    /// Identity of the active request; bumped on every replacement or cancel
    /// so callbacks for superseded requests can be discarded.
    generation: u64,
    request: Option<RequestDescriptor>,
    sensor_tx: mpsc::UnboundedSender<(u64, SensorEvent)>,
    results: mpsc::UnboundedSender<UpdateResult>,
}

impl NegotiationController {
    pub fn new(
        permission: PermissionGate,
        settings: SettingsGate,
        session: UpdateSession,
        sensor_tx: mpsc::UnboundedSender<(u64, SensorEvent)>,
        results: mpsc::UnboundedSender<UpdateResult>,
    ) -> Self {
        Self {
            permission,
            settings,
            session,
            state: NegotiationState::Idle,
            generation: 0,
            request: None,
            sensor_tx,
            results,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_request(&self) -> Option<&RequestDescriptor> {
        self.request.as_ref()
    }

    /// Start (or restart) a negotiation for `req`.
    ///
    /// A new descriptor always wins over an in-flight negotiation for an
    /// older one: the prior session is stopped and its pending callbacks are
    /// discarded by the generation filter.
    pub fn set_request(&mut self, req: RequestDescriptor) {
        self.generation += 1;
        self.session.stop();
        info!(
            generation = self.generation,
            priority = %req.priority(),
            interval_ms = req.interval_ms(),
            "negotiation started"
        );
        self.request = Some(req);
        self.state = NegotiationState::CheckingPermission;
        self.check_permission();
    }

    /// Tear down the active negotiation and session.
    ///
    /// Silent: nothing is emitted after cancel, and a sensor callback already
    /// in flight is discarded by the generation filter.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.session.stop();
        self.request = None;
        self.state = NegotiationState::Idle;
        debug!(generation = self.generation, "negotiation cancelled");
    }

    /// Owner scope ended: report cancellation to the consumer, then tear down
    pub fn close(&mut self) {
        if self.state != NegotiationState::Idle {
            self.emit(UpdateResult::Failure(LocationError::Cancelled));
        }
        self.cancel();
    }

    /// Ask the host to present the permission prompt
    pub fn solicit_permission(&mut self) {
        self.permission.request_grant();
    }

    /// Re-check the permission after the host finished its grant flow
    pub fn resume_after_permission(&mut self) {
        if self.state != NegotiationState::PermissionBlocked {
            debug!(state = %self.state, "resume_after_permission ignored");
            return;
        }
        self.state = NegotiationState::CheckingPermission;
        self.check_permission();
    }

    /// Report the outcome of the settings resolution flow.
    ///
    /// Accepted outcomes re-evaluate the settings; a rejection reports the
    /// deficiency again and stays blocked until the caller retries.
    pub fn resume_after_settings(&mut self, accepted: bool) {
        if self.state != NegotiationState::SettingsBlocked {
            debug!(state = %self.state, "resume_after_settings ignored");
            return;
        }
        if accepted {
            self.state = NegotiationState::CheckingSettings;
            self.check_settings();
        } else {
            warn!("settings resolution rejected by user");
            self.emit(UpdateResult::Failure(LocationError::SettingsChangeRequired {
                resolution: None,
            }));
        }
    }

    /// One-shot query for the platform's cached fix.
    ///
    /// Permission-checked, but never consults the settings gate and never
    /// perturbs the negotiation state.
    pub fn last_known(&mut self) {
        match self.permission.check() {
            PermissionStatus::Denied => {
                self.emit(UpdateResult::Failure(LocationError::PermissionsRequired));
            }
            PermissionStatus::Granted => {
                if let Some(fix) = self.session.last_known() {
                    self.emit(UpdateResult::Success(fix));
                }
            }
        }
    }

    /// Entry point for sensor callbacks. Events whose generation does not
    /// match the active request are stale and dropped.
    pub fn on_sensor_event(&mut self, generation: u64, event: SensorEvent) {
        if generation != self.generation {
            debug!(
                stale = generation,
                active = self.generation,
                "discarding stale sensor event"
            );
            return;
        }
        if self.state != NegotiationState::Streaming {
            return;
        }
        match event {
            SensorEvent::Fix(fix) => self.emit(UpdateResult::Success(fix)),
            SensorEvent::Interrupted(reason) => {
                warn!(%reason, "sensor source interrupted");
                self.session.stop();
                self.state = NegotiationState::Idle;
                self.request = None;
                self.emit(UpdateResult::Failure(LocationError::Unavailable));
            }
        }
    }

    fn check_permission(&mut self) {
        match self.permission.check() {
            PermissionStatus::Granted => {
                self.state = NegotiationState::CheckingSettings;
                self.check_settings();
            }
            PermissionStatus::Denied => {
                warn!("location permission denied");
                self.state = NegotiationState::PermissionBlocked;
                self.emit(UpdateResult::Failure(LocationError::PermissionsRequired));
            }
        }
    }

    fn check_settings(&mut self) {
        let req = match self.request.clone() {
            Some(req) => req,
            None => {
                self.state = NegotiationState::Idle;
                return;
            }
        };
        match self.settings.evaluate(&req) {
            SettingsVerdict::Satisfied => self.start_streaming(&req),
            SettingsVerdict::Resolvable(handle) => {
                info!(resolution = %handle.id(), "settings deficiency is resolvable");
                self.state = NegotiationState::SettingsBlocked;
                self.emit(UpdateResult::Failure(LocationError::SettingsChangeRequired {
                    resolution: Some(handle),
                }));
            }
            SettingsVerdict::Unavailable => {
                warn!("no resolution path for settings deficiency");
                self.state = NegotiationState::Idle;
                self.request = None;
                self.emit(UpdateResult::Failure(LocationError::Unavailable));
            }
        }
    }

    fn start_streaming(&mut self, req: &RequestDescriptor) {
        match self.session.start(self.generation, req, &self.sensor_tx) {
            Ok(()) => {
                info!(generation = self.generation, "streaming location updates");
                self.state = NegotiationState::Streaming;
            }
            Err(SensorError::PermissionDenied) => {
                // The platform disagreed with the gate; treat as a denial
                warn!("sensor source reported permission denied");
                self.state = NegotiationState::PermissionBlocked;
                self.emit(UpdateResult::Failure(LocationError::PermissionsRequired));
            }
            Err(SensorError::Unavailable(reason)) => {
                warn!(%reason, "sensor source rejected the subscription");
                self.state = NegotiationState::Idle;
                self.request = None;
                self.emit(UpdateResult::Failure(LocationError::Unavailable));
            }
        }
    }

    fn emit(&self, result: UpdateResult) {
        if self.results.send(result).is_err() {
            debug!("result receiver dropped; emission discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::Fix;
    use crate::permission::PermissionBackend;
    use crate::request::Priority;
    use crate::sensor::{SensorSink, SensorSource, SubscriptionId};
    use crate::settings::{ResolutionHandle, SettingsBackend};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakePermission {
        granted: Arc<AtomicBool>,
    }

    impl PermissionBackend for FakePermission {
        fn check(&self) -> PermissionStatus {
            if self.granted.load(Ordering::SeqCst) {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            }
        }

        fn request_grant(&mut self) {}
    }

    struct FakeSettings {
        verdict: Arc<Mutex<SettingsVerdict>>,
    }

    impl SettingsBackend for FakeSettings {
        fn evaluate(&self, _req: &RequestDescriptor) -> SettingsVerdict {
            self.verdict.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct FakeSensor {
        next_id: u64,
        sinks: Arc<Mutex<Vec<SensorSink>>>,
    }

    impl SensorSource for FakeSensor {
        fn subscribe(
            &mut self,
            _req: &RequestDescriptor,
            sink: SensorSink,
        ) -> Result<SubscriptionId, SensorError> {
            self.next_id += 1;
            self.sinks.lock().unwrap().push(sink);
            Ok(SubscriptionId(self.next_id))
        }

        fn unsubscribe(&mut self, _id: SubscriptionId) {}

        fn last_known(&self) -> Option<Fix> {
            None
        }
    }

    struct Harness {
        controller: NegotiationController,
        sensor_rx: mpsc::UnboundedReceiver<(u64, SensorEvent)>,
        result_rx: mpsc::UnboundedReceiver<UpdateResult>,
        granted: Arc<AtomicBool>,
        verdict: Arc<Mutex<SettingsVerdict>>,
        sinks: Arc<Mutex<Vec<SensorSink>>>,
    }

    fn harness(granted: bool, verdict: SettingsVerdict) -> Harness {
        let granted = Arc::new(AtomicBool::new(granted));
        let verdict = Arc::new(Mutex::new(verdict));
        let sinks = Arc::new(Mutex::new(Vec::new()));
        let (sensor_tx, sensor_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let controller = NegotiationController::new(
            PermissionGate::new(Box::new(FakePermission {
                granted: granted.clone(),
            })),
            SettingsGate::new(Box::new(FakeSettings {
                verdict: verdict.clone(),
            })),
            UpdateSession::new(Box::new(FakeSensor {
                next_id: 0,
                sinks: sinks.clone(),
            })),
            sensor_tx,
            result_tx,
        );
        Harness {
            controller,
            sensor_rx,
            result_rx,
            granted,
            verdict,
            sinks,
        }
    }

    fn req() -> RequestDescriptor {
        RequestDescriptor::new(Priority::HighAccuracy, 2000, 1000).unwrap()
    }

    /// Drain queued sensor events into the controller, as the service loop
    /// would.
    fn pump(h: &mut Harness) {
        while let Ok((generation, event)) = h.sensor_rx.try_recv() {
            h.controller.on_sensor_event(generation, event);
        }
    }

    #[test]
    fn test_happy_path_reaches_streaming() {
        let mut h = harness(true, SettingsVerdict::Satisfied);
        h.controller.set_request(req());
        assert_eq!(h.controller.state(), NegotiationState::Streaming);

        h.sinks.lock().unwrap()[0].deliver(Fix::new(59.91, 10.75, 4.0));
        pump(&mut h);

        let result = h.result_rx.try_recv().unwrap();
        assert!(result.is_success());
    }

    #[test]
    fn test_denied_permission_blocks_with_single_failure() {
        let mut h = harness(false, SettingsVerdict::Satisfied);
        h.controller.set_request(req());

        assert_eq!(h.controller.state(), NegotiationState::PermissionBlocked);
        let result = h.result_rx.try_recv().unwrap();
        assert_eq!(
            result.error().unwrap(),
            &LocationError::PermissionsRequired
        );
        assert!(h.result_rx.try_recv().is_err());
    }

    #[test]
    fn test_resume_after_grant_skips_straight_to_streaming() {
        let mut h = harness(false, SettingsVerdict::Satisfied);
        h.controller.set_request(req());
        let _ = h.result_rx.try_recv();

        h.granted.store(true, Ordering::SeqCst);
        h.controller.resume_after_permission();

        assert_eq!(h.controller.state(), NegotiationState::Streaming);
        assert!(h.result_rx.try_recv().is_err());
    }

    #[test]
    fn test_resolvable_settings_blocks_until_resolution() {
        let mut h = harness(
            true,
            SettingsVerdict::Resolvable(ResolutionHandle::tagged("enable-gps")),
        );
        h.controller.set_request(req());

        assert_eq!(h.controller.state(), NegotiationState::SettingsBlocked);
        let result = h.result_rx.try_recv().unwrap();
        assert!(result.error().unwrap().resolution().is_some());

        // Rejection reports again and stays blocked
        h.controller.resume_after_settings(false);
        assert_eq!(h.controller.state(), NegotiationState::SettingsBlocked);
        let result = h.result_rx.try_recv().unwrap();
        assert_eq!(
            result.error().unwrap().kind(),
            crate::error::ErrorKind::SettingsChangeRequired
        );

        // Acceptance re-evaluates against the now-adequate settings
        *h.verdict.lock().unwrap() = SettingsVerdict::Satisfied;
        h.controller.resume_after_settings(true);
        assert_eq!(h.controller.state(), NegotiationState::Streaming);
    }

    #[test]
    fn test_settings_unavailable_returns_to_idle() {
        let mut h = harness(true, SettingsVerdict::Unavailable);
        h.controller.set_request(req());

        assert_eq!(h.controller.state(), NegotiationState::Idle);
        let result = h.result_rx.try_recv().unwrap();
        assert_eq!(result.error().unwrap(), &LocationError::Unavailable);
    }

    #[test]
    fn test_cancel_is_silent_and_filters_inflight_fixes() {
        let mut h = harness(true, SettingsVerdict::Satisfied);
        h.controller.set_request(req());

        let sink = h.sinks.lock().unwrap()[0].clone();
        h.controller.cancel();

        // Callback already in flight when stop was issued
        sink.deliver(Fix::new(59.91, 10.75, 4.0));
        pump(&mut h);

        assert_eq!(h.controller.state(), NegotiationState::Idle);
        assert!(h.result_rx.try_recv().is_err());
    }

    #[test]
    fn test_new_descriptor_supersedes_streaming_session() {
        let mut h = harness(true, SettingsVerdict::Satisfied);
        h.controller.set_request(req());
        let old_sink = h.sinks.lock().unwrap()[0].clone();

        let newer = RequestDescriptor::new(Priority::LowPower, 10_000, 5_000).unwrap();
        h.controller.set_request(newer.clone());
        assert_eq!(h.controller.state(), NegotiationState::Streaming);
        assert_eq!(h.controller.active_request(), Some(&newer));

        // Late callback from the superseded session is discarded
        old_sink.deliver(Fix::new(1.0, 2.0, 3.0));
        pump(&mut h);
        assert!(h.result_rx.try_recv().is_err());

        // The live session still delivers
        let new_sink = h.sinks.lock().unwrap().last().unwrap().clone();
        new_sink.deliver(Fix::new(59.91, 10.75, 4.0));
        pump(&mut h);
        assert!(h.result_rx.try_recv().unwrap().is_success());
    }

    #[test]
    fn test_sensor_interruption_surfaces_unavailable() {
        let mut h = harness(true, SettingsVerdict::Satisfied);
        h.controller.set_request(req());

        h.sinks.lock().unwrap()[0].interrupted("provider disconnected");
        pump(&mut h);

        assert_eq!(h.controller.state(), NegotiationState::Idle);
        let result = h.result_rx.try_recv().unwrap();
        assert_eq!(result.error().unwrap(), &LocationError::Unavailable);
    }

    #[test]
    fn test_stray_resumes_are_ignored() {
        let mut h = harness(true, SettingsVerdict::Satisfied);
        h.controller.resume_after_permission();
        h.controller.resume_after_settings(true);
        assert_eq!(h.controller.state(), NegotiationState::Idle);
        assert!(h.result_rx.try_recv().is_err());
    }

    #[test]
    fn test_last_known_checks_permission_only() {
        let mut h = harness(false, SettingsVerdict::Unavailable);
        h.controller.last_known();
        let result = h.result_rx.try_recv().unwrap();
        assert_eq!(
            result.error().unwrap(),
            &LocationError::PermissionsRequired
        );
        // Settings gate was never involved
        assert_eq!(h.controller.state(), NegotiationState::Idle);
    }
}
