//! Switch-latest binding from a descriptor stream to the pipeline.

use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::request::RequestDescriptor;
use crate::service::LiveFixHandle;

/// Maps a changing stream of request descriptors onto the pipeline.
///
/// Each descriptor supersedes the previous negotiation (switch-latest). When
/// the descriptor stream closes, the binding closes the pipeline, which
/// reports one final `Cancelled` failure to any consumer still listening.
pub struct ReactiveBinding {
    task: JoinHandle<()>,
}

impl ReactiveBinding {
    pub fn bind<S>(mut requests: S, handle: LiveFixHandle) -> Self
    where
        S: Stream<Item = RequestDescriptor> + Send + Unpin + 'static,
    {
        let task = tokio::spawn(async move {
            while let Some(req) = requests.next().await {
                handle.set_request(req);
            }
            debug!("descriptor stream closed; closing pipeline");
            handle.close();
        });
        Self { task }
    }

    /// Wait for the binding task to finish (descriptor stream exhausted)
    pub async fn join(self) {
        let _ = self.task.await;
    }

    /// Drop the binding without waiting; the pipeline itself is untouched
    pub fn abort(&self) {
        self.task.abort();
    }
}
