use crate::coordinator::ReplicationCoordinator;
use crate::operations::{DownloadOperation, UploadOperation};
use crate::registry::NodeRegistry;
use crate::router::ReadRouter;
use crate::store::ChunkStream;
use crate::{MirioError, Result};
use serde::Serialize;
use std::sync::Arc;

/// The service façade: upload, download, metadata, listing, delete.
///
/// Owns no business logic beyond argument validation (non-empty name)
/// and dispatch to the coordinator, router, and stream operations.
pub struct Gateway {
    registry: Arc<NodeRegistry>,
    router: Arc<ReadRouter>,
    coordinator: Arc<ReplicationCoordinator>,
    upload_op: UploadOperation,
    download_op: DownloadOperation,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub file_name: String,
    /// RFC 3339 timestamp as reported by the node the router selected.
    pub upload_time: String,
    /// Opaque backend-assigned version tag.
    pub version: String,
}

impl Gateway {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        let router = Arc::new(ReadRouter::new(Arc::clone(&registry)));
        let coordinator = Arc::new(ReplicationCoordinator::new(Arc::clone(&registry)));

        Self {
            upload_op: UploadOperation::new(Arc::clone(&coordinator)),
            download_op: DownloadOperation::new(Arc::clone(&registry), Arc::clone(&router)),
            registry,
            router,
            coordinator,
        }
    }

    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    pub fn bucket(&self) -> &str {
        self.registry.bucket()
    }

    /// Client-streaming upload. The file name is the out-of-band side
    /// channel of the call; the stream carries only chunk data.
    pub async fn upload(&self, file_name: &str, stream: ChunkStream) -> Result<String> {
        let file_name = validate_file_name(file_name)?;

        let outcome = self.upload_op.run(file_name, stream).await?;
        tracing::info!(
            "uploaded {} ({} bytes) to {} nodes",
            outcome.file_name,
            outcome.size_bytes,
            self.registry.len()
        );

        Ok(format!("File {} uploaded successfully", file_name))
    }

    /// Server-streaming download; `NotFound` is decided before the
    /// stream is returned.
    pub async fn download(&self, file_name: &str) -> Result<ChunkStream> {
        let file_name = validate_file_name(file_name)?;
        self.download_op.run(file_name).await
    }

    pub async fn get_metadata(&self, file_name: &str) -> Result<FileMetadata> {
        let file_name = validate_file_name(file_name)?;

        let node = self.router.next_node();
        let stat = node.stat(self.registry.bucket(), file_name).await?;

        Ok(FileMetadata {
            file_name: file_name.to_string(),
            upload_time: stat.last_modified.to_rfc3339(),
            version: stat.version_tag,
        })
    }

    pub async fn list_files(&self) -> Result<Vec<String>> {
        let node = self.router.next_node();
        node.list(self.registry.bucket()).await
    }

    pub async fn delete_file(&self, file_name: &str) -> Result<String> {
        let file_name = validate_file_name(file_name)?;

        self.coordinator.delete(file_name).await?;
        tracing::info!("deleted {} from {} nodes", file_name, self.registry.len());

        Ok(format!("File {} deleted successfully", file_name))
    }
}

fn validate_file_name(file_name: &str) -> Result<&str> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(MirioError::InvalidRequest(
            "file name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
