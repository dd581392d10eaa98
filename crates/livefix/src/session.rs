//! Ownership of the live sensor subscription.

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::SensorError;
use crate::fix::Fix;
use crate::request::RequestDescriptor;
use crate::sensor::{SensorEvent, SensorSink, SensorSource, SubscriptionId};

/// Owns at most one live subscription to the sensor source.
///
/// Starting a new session implicitly stops any prior one: supersession, not
/// queuing.
pub struct UpdateSession {
    source: Box<dyn SensorSource>,
    active: Option<ActiveSubscription>,
}

struct ActiveSubscription {
    generation: u64,
    id: SubscriptionId,
}

impl UpdateSession {
    pub fn new(source: Box<dyn SensorSource>) -> Self {
        Self {
            source,
            active: None,
        }
    }

    /// Open a subscription for `req` under `generation`, stopping any prior
    /// one first.
    pub fn start(
        &mut self,
        generation: u64,
        req: &RequestDescriptor,
        events: &mpsc::UnboundedSender<(u64, SensorEvent)>,
    ) -> Result<(), SensorError> {
        self.stop();
        let sink = SensorSink::new(generation, events.clone());
        let id = self.source.subscribe(req, sink)?;
        self.active = Some(ActiveSubscription { generation, id });
        debug!(generation, "sensor subscription opened");
        Ok(())
    }

    /// Unregister the live subscription, if any
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            self.source.unsubscribe(active.id);
            debug!(generation = active.generation, "sensor subscription closed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.generation)
    }

    pub fn last_known(&self) -> Option<Fix> {
        self.source.last_known()
    }
}
