//! Actor wrapper serializing controller transitions.
//!
//! A single tokio task owns the controller; inbound calls and sensor
//! deliveries arrive as commands on one channel, so every state transition
//! runs on one logical owner with no internal parallelism.

use tokio::sync::mpsc;
use tracing::debug;

use crate::controller::NegotiationController;
use crate::fix::UpdateResult;
use crate::permission::{PermissionBackend, PermissionGate};
use crate::request::RequestDescriptor;
use crate::sensor::SensorSource;
use crate::session::UpdateSession;
use crate::settings::{SettingsBackend, SettingsGate};

/// Inbound operations on the pipeline
#[derive(Debug)]
enum Command {
    SetRequest(RequestDescriptor),
    Cancel,
    Close,
    SolicitPermission,
    ResumeAfterPermission,
    ResumeAfterSettings { accepted: bool },
    LastKnown,
}

/// Cloneable handle to a running pipeline.
///
/// Dropping every handle stops the service task and tears down any live
/// sensor subscription.
#[derive(Clone)]
pub struct LiveFixHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl LiveFixHandle {
    /// Start (or restart) a negotiation; the newest request always wins
    pub fn set_request(&self, req: RequestDescriptor) {
        self.send(Command::SetRequest(req));
    }

    /// Tear down the active negotiation without emitting
    pub fn cancel(&self) {
        self.send(Command::Cancel);
    }

    /// Report cancellation to the consumer, then tear down
    pub fn close(&self) {
        self.send(Command::Close);
    }

    /// Ask the host to present the permission prompt
    pub fn solicit_permission(&self) {
        self.send(Command::SolicitPermission);
    }

    /// Re-check the permission after the host grant flow finished
    pub fn resume_after_permission(&self) {
        self.send(Command::ResumeAfterPermission);
    }

    /// Report the settings resolution outcome
    pub fn resume_after_settings(&self, accepted: bool) {
        self.send(Command::ResumeAfterSettings { accepted });
    }

    /// One-shot query for the platform's cached fix
    pub fn last_known(&self) {
        self.send(Command::LastKnown);
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            debug!("livefix service already stopped; command dropped");
        }
    }
}

/// Spawn the pipeline over the given platform backends.
///
/// Returns the inbound handle and the single result stream. The stream is
/// meant for exactly one logical subscriber; multiplexing is a caller
/// responsibility.
pub fn spawn(
    permission: Box<dyn PermissionBackend>,
    settings: Box<dyn SettingsBackend>,
    source: Box<dyn SensorSource>,
) -> (LiveFixHandle, mpsc::UnboundedReceiver<UpdateResult>) {
    let (result_tx, result_rx) = mpsc::unbounded_channel();
    let (sensor_tx, mut sensor_rx) = mpsc::unbounded_channel();
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();

    let mut controller = NegotiationController::new(
        PermissionGate::new(permission),
        SettingsGate::new(settings),
        UpdateSession::new(source),
        sensor_tx,
        result_tx,
    );

    tokio::spawn(async move {
        loop {
            tokio::select! {
                command = cmd_rx.recv() => match command {
                    Some(command) => apply(&mut controller, command),
                    // All handles dropped: owner scope ended
                    None => break,
                },
                Some((generation, event)) = sensor_rx.recv() => {
                    controller.on_sensor_event(generation, event);
                }
            }
        }
        controller.cancel();
        debug!("livefix service stopped");
    });

    (LiveFixHandle { tx: cmd_tx }, result_rx)
}

fn apply(controller: &mut NegotiationController, command: Command) {
    match command {
        Command::SetRequest(req) => controller.set_request(req),
        Command::Cancel => controller.cancel(),
        Command::Close => controller.close(),
        Command::SolicitPermission => controller.solicit_permission(),
        Command::ResumeAfterPermission => controller.resume_after_permission(),
        Command::ResumeAfterSettings { accepted } => controller.resume_after_settings(accepted),
        Command::LastKnown => controller.last_known(),
    }
}
