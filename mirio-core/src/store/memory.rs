use super::{ChunkStream, NodeStore, ObjectStat};
use crate::{MirioError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Chunk size for reads, so multi-chunk egress paths get exercised even
/// against the in-process store.
const READ_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
    version_tag: String,
}

/// In-process `NodeStore` used by tests and local demos. Mirrors the S3
/// adapter's contract: puts overwrite, gets chunk lazily, the version
/// tag is content-derived.
pub struct MemoryNodeStore {
    endpoint: String,
    buckets: RwLock<HashMap<String, HashMap<String, StoredObject>>>,
}

impl MemoryNodeStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            buckets: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn put(&self, bucket: &str, name: &str, data: Bytes) -> Result<()> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets.get_mut(bucket).ok_or_else(|| {
            MirioError::Store(format!("{}: no such bucket: {}", self.endpoint, bucket))
        })?;

        let version_tag = compute_version_tag(&data);
        objects.insert(
            name.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
                version_tag,
            },
        );

        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> Result<ChunkStream> {
        let buckets = self.buckets.read().await;
        let objects = buckets.get(bucket).ok_or_else(|| {
            MirioError::Store(format!("{}: no such bucket: {}", self.endpoint, bucket))
        })?;

        let object = objects
            .get(name)
            .ok_or_else(|| MirioError::NotFound(name.to_string()))?;

        let data = object.data.clone();
        let mut chunks = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + READ_CHUNK_SIZE).min(data.len());
            chunks.push(Ok(data.slice(offset..end)));
            offset = end;
        }

        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn stat(&self, bucket: &str, name: &str) -> Result<ObjectStat> {
        let buckets = self.buckets.read().await;
        let objects = buckets.get(bucket).ok_or_else(|| {
            MirioError::Store(format!("{}: no such bucket: {}", self.endpoint, bucket))
        })?;

        let object = objects
            .get(name)
            .ok_or_else(|| MirioError::NotFound(name.to_string()))?;

        Ok(ObjectStat {
            last_modified: object.last_modified,
            version_tag: object.version_tag.clone(),
        })
    }

    async fn list(&self, bucket: &str) -> Result<Vec<String>> {
        let buckets = self.buckets.read().await;
        let objects = buckets.get(bucket).ok_or_else(|| {
            MirioError::Store(format!("{}: no such bucket: {}", self.endpoint, bucket))
        })?;

        Ok(objects.keys().cloned().collect())
    }

    async fn delete(&self, bucket: &str, name: &str) -> Result<()> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets.get_mut(bucket).ok_or_else(|| {
            MirioError::Store(format!("{}: no such bucket: {}", self.endpoint, bucket))
        })?;

        objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MirioError::NotFound(name.to_string()))
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str, _region: &str) -> Result<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }
}

/// SHA-256 hex of the payload, used as the opaque version tag.
pub fn compute_version_tag(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
