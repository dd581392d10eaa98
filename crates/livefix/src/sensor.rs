//! Seam to the opaque platform location provider.

use tokio::sync::mpsc;

use crate::error::SensorError;
use crate::fix::Fix;
use crate::request::RequestDescriptor;

/// Event pushed by the sensor source into the pipeline
#[derive(Debug, Clone)]
pub enum SensorEvent {
    /// A fresh location fix
    Fix(Fix),
    /// The provider stopped delivering (disconnect, hardware fault)
    Interrupted(String),
}

/// Identifier of one live subscription on the sensor source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Generation-tagged sender handed to the sensor source.
///
/// Every event carries the generation of the request that opened the
/// subscription; events for a superseded generation are discarded on receipt
/// rather than relied upon to stop at the source.
#[derive(Debug, Clone)]
pub struct SensorSink {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, SensorEvent)>,
}

impl SensorSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, SensorEvent)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver a fix. Silently dropped once the pipeline is gone.
    pub fn deliver(&self, fix: Fix) {
        let _ = self.tx.send((self.generation, SensorEvent::Fix(fix)));
    }

    /// Report that the provider stopped delivering
    pub fn interrupted(&self, reason: impl Into<String>) {
        let _ = self
            .tx
            .send((self.generation, SensorEvent::Interrupted(reason.into())));
    }
}

/// The platform location-fusion provider, treated as an opaque sensor.
///
/// Implementations register/unregister real platform callbacks; the rest of
/// the pipeline never touches the platform API directly.
pub trait SensorSource: Send {
    /// Begin continuous updates for `req`, pushing events through `sink`
    fn subscribe(
        &mut self,
        req: &RequestDescriptor,
        sink: SensorSink,
    ) -> Result<SubscriptionId, SensorError>;

    /// Tear down a subscription. An event already in flight may still arrive
    /// and is dropped by the generation filter.
    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Most recent cached fix, if the platform holds one
    fn last_known(&self) -> Option<Fix>;
}
