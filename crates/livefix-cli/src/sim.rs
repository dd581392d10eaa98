//! Simulated platform backends.
//!
//! Deterministic stand-ins for the permission prompt, the settings check and
//! the location-fusion provider, so scripted scenarios run without any
//! platform involved.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use livefix::{
    Fix, PermissionBackend, PermissionStatus, RequestDescriptor, ResolutionHandle, SensorError,
    SensorSink, SensorSource, SettingsBackend, SettingsVerdict, SubscriptionId,
};
use tracing::debug;

/// Permission that stays denied until the host grant flow runs
#[derive(Clone)]
pub struct SimPermission {
    granted: Arc<AtomicBool>,
}

impl SimPermission {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: Arc::new(AtomicBool::new(granted)),
        }
    }

    /// Outcome of the simulated host grant flow
    pub fn grant(&self) {
        self.granted.store(true, Ordering::SeqCst);
    }
}

impl PermissionBackend for SimPermission {
    fn check(&self) -> PermissionStatus {
        if self.granted.load(Ordering::SeqCst) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    fn request_grant(&mut self) {
        debug!("host permission prompt requested");
    }
}

/// Settings that offer a resolvable deficiency until resolved
#[derive(Clone)]
pub struct SimSettings {
    adequate: Arc<AtomicBool>,
}

impl SimSettings {
    pub fn new(adequate: bool) -> Self {
        Self {
            adequate: Arc::new(AtomicBool::new(adequate)),
        }
    }

    /// Outcome of the simulated resolution flow
    pub fn resolve(&self) {
        self.adequate.store(true, Ordering::SeqCst);
    }
}

impl SettingsBackend for SimSettings {
    fn evaluate(&self, _req: &RequestDescriptor) -> SettingsVerdict {
        if self.adequate.load(Ordering::SeqCst) {
            SettingsVerdict::Satisfied
        } else {
            SettingsVerdict::Resolvable(ResolutionHandle::tagged("enable-location-services"))
        }
    }
}

/// Simulated location-fusion provider: each subscription walks a fix
/// north-east from the Oslo city center at the requested cadence.
pub struct SimSensor {
    next_id: u64,
    tasks: HashMap<u64, tokio::task::JoinHandle<()>>,
    last_known: Arc<Mutex<Option<Fix>>>,
}

impl SimSensor {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            tasks: HashMap::new(),
            last_known: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_last_known(fix: Fix) -> Self {
        let sensor = Self::new();
        *sensor.last_known.lock().unwrap() = Some(fix);
        sensor
    }
}

impl SensorSource for SimSensor {
    fn subscribe(
        &mut self,
        req: &RequestDescriptor,
        sink: SensorSink,
    ) -> Result<SubscriptionId, SensorError> {
        self.next_id += 1;
        let cadence = Duration::from_millis(req.interval_ms().max(50));
        let last_known = self.last_known.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            let mut step: u64 = 0;
            loop {
                ticker.tick().await;
                let fix = Fix::new(
                    59.9139 + step as f64 * 1.2e-5,
                    10.7522 + step as f64 * 2.1e-5,
                    3.0 + (step % 4) as f32,
                );
                *last_known.lock().unwrap() = Some(fix.clone());
                sink.deliver(fix);
                step += 1;
            }
        });

        self.tasks.insert(self.next_id, task);
        Ok(SubscriptionId(self.next_id))
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if let Some(task) = self.tasks.remove(&id.0) {
            task.abort();
        }
    }

    fn last_known(&self) -> Option<Fix> {
        self.last_known.lock().unwrap().clone()
    }
}

impl Drop for SimSensor {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}
