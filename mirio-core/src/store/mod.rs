//! Backend store adapters for Mirio
//!
//! One adapter per physical storage node. The gateway never talks to a
//! backend except through the `NodeStore` trait.

pub mod memory;
pub mod s3;

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;

pub use memory::{MemoryNodeStore, compute_version_tag};
pub use s3::S3NodeStore;

/// Lazy, finite, single-pass sequence of payload chunks.
pub type ChunkStream = BoxStream<'static, Result<Bytes>>;

/// Per-replica object metadata as reported by one node.
#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub last_modified: DateTime<Utc>,
    /// Opaque backend-assigned identity tag for the current content (ETag).
    pub version_tag: String,
}

/// Capability interface over a single S3-compatible storage node.
///
/// All operations may block on network I/O; callers cancel by dropping
/// the returned future.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Stable identifier for the node, used in logs and error messages.
    fn endpoint(&self) -> &str;

    /// Writes the full object, overwriting unconditionally.
    async fn put(&self, bucket: &str, name: &str, data: Bytes) -> Result<()>;

    /// Opens a chunk stream over the object body. `NotFound` is decided
    /// before any stream is handed back.
    async fn get(&self, bucket: &str, name: &str) -> Result<ChunkStream>;

    async fn stat(&self, bucket: &str, name: &str) -> Result<ObjectStat>;

    /// Enumerates every object name in the bucket, unordered.
    async fn list(&self, bucket: &str) -> Result<Vec<String>>;

    async fn delete(&self, bucket: &str, name: &str) -> Result<()>;

    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()>;
}
