use crate::Result;
use crate::coordinator::ReplicationCoordinator;
use crate::store::ChunkStream;
use bytes::BytesMut;
use futures_util::TryStreamExt;
use std::sync::Arc;

/// Ingestion stream handler: one run per upload session.
///
/// Consumes the inbound chunk stream in arrival order into an
/// accumulation buffer, then hands the complete payload to the
/// replication coordinator once the stream ends. If the stream errors
/// or the coordinator reports failure the session is discarded and
/// nothing is acknowledged as stored. A zero-chunk stream is a valid
/// empty object and still replicates.
pub struct UploadOperation {
    coordinator: Arc<ReplicationCoordinator>,
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file_name: String,
    pub size_bytes: u64,
}

impl UploadOperation {
    pub fn new(coordinator: Arc<ReplicationCoordinator>) -> Self {
        Self { coordinator }
    }

    /// `file_name` rides alongside the stream handle, out of band from
    /// the chunk payload; it is part of the call contract, not the
    /// stream protocol.
    pub async fn run(&self, file_name: &str, mut stream: ChunkStream) -> Result<UploadOutcome> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.try_next().await? {
            buffer.extend_from_slice(&chunk);
        }

        let payload = buffer.freeze();
        let size_bytes = payload.len() as u64;

        self.coordinator.write(file_name, payload).await?;

        Ok(UploadOutcome {
            file_name: file_name.to_string(),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeRegistry;
    use crate::store::{MemoryNodeStore, NodeStore};
    use crate::MirioError;
    use bytes::Bytes;
    use futures_util::stream;

    async fn setup(node_count: usize) -> (Arc<NodeRegistry>, UploadOperation) {
        let nodes: Vec<Arc<dyn NodeStore>> = (0..node_count)
            .map(|i| Arc::new(MemoryNodeStore::new(format!("mem-{}", i))) as Arc<dyn NodeStore>)
            .collect();
        let registry = Arc::new(NodeRegistry::new(nodes, "files").unwrap());
        registry.ensure_bucket("us-east-1").await.unwrap();
        let coordinator = Arc::new(ReplicationCoordinator::new(Arc::clone(&registry)));
        (registry, UploadOperation::new(coordinator))
    }

    fn chunked(chunks: Vec<&'static [u8]>) -> ChunkStream {
        Box::pin(stream::iter(
            chunks.into_iter().map(|chunk| Ok(Bytes::from_static(chunk))),
        ))
    }

    #[tokio::test]
    async fn test_chunks_accumulate_in_arrival_order() {
        let (registry, op) = setup(2).await;

        let outcome = op
            .run("song.mp3", chunked(vec![b"ab", b"cd", b"ef"]))
            .await
            .unwrap();
        assert_eq!(outcome.size_bytes, 6);

        for node in registry.nodes() {
            let stat = node.stat("files", "song.mp3").await.unwrap();
            assert_eq!(
                stat.version_tag,
                crate::store::compute_version_tag(b"abcdef")
            );
        }
    }

    #[tokio::test]
    async fn test_empty_stream_is_a_valid_empty_object() {
        let (registry, op) = setup(3).await;

        let outcome = op.run("empty.bin", chunked(Vec::new())).await.unwrap();
        assert_eq!(outcome.size_bytes, 0);

        for node in registry.nodes() {
            assert!(node.stat("files", "empty.bin").await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_inbound_stream_error_stores_nothing() {
        let (registry, op) = setup(2).await;

        let broken: ChunkStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(MirioError::Store("client went away".to_string())),
        ]));

        let error = op.run("half.bin", broken).await.unwrap_err();
        assert!(matches!(error, MirioError::Store(_)));

        for node in registry.nodes() {
            assert!(
                node.stat("files", "half.bin")
                    .await
                    .unwrap_err()
                    .is_not_found()
            );
        }
    }
}
