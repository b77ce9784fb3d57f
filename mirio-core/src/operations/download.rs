use crate::Result;
use crate::registry::NodeRegistry;
use crate::router::ReadRouter;
use crate::store::ChunkStream;
use std::sync::Arc;

/// Egress stream handler: picks one node via the read router and opens
/// a chunk stream over the object body.
///
/// The backend `get` completes before a stream is handed back, so a
/// missing object surfaces as `NotFound` without a single payload byte
/// being emitted. Backend chunks are forwarded verbatim and in order; a
/// mid-stream backend fault arrives as an `Err` item and aborts the
/// outbound stream rather than truncating it silently.
pub struct DownloadOperation {
    registry: Arc<NodeRegistry>,
    router: Arc<ReadRouter>,
}

impl DownloadOperation {
    pub fn new(registry: Arc<NodeRegistry>, router: Arc<ReadRouter>) -> Self {
        Self { registry, router }
    }

    pub async fn run(&self, file_name: &str) -> Result<ChunkStream> {
        let node = self.router.next_node();
        tracing::debug!("download of {} routed to {}", file_name, node.endpoint());
        node.get(self.registry.bucket(), file_name).await
    }
}
