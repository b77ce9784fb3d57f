use crate::store::NodeStore;
use crate::{MirioError, Result};
use std::sync::Arc;

/// The fixed, ordered set of backend adapters configured at startup.
///
/// Read-only after construction; membership never changes while the
/// process runs.
pub struct NodeRegistry {
    nodes: Vec<Arc<dyn NodeStore>>,
    bucket: String,
}

impl NodeRegistry {
    pub fn new(nodes: Vec<Arc<dyn NodeStore>>, bucket: impl Into<String>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(MirioError::Config(
                "at least one storage node must be configured".to_string(),
            ));
        }

        Ok(Self {
            nodes,
            bucket: bucket.into(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Arc<dyn NodeStore>] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Arc<dyn NodeStore> {
        &self.nodes[index]
    }

    /// Bucket bootstrap: check-then-create on every node, before any
    /// traffic is accepted. Idempotent; a create race lost to another
    /// client is logged and accepted as success.
    pub async fn ensure_bucket(&self, region: &str) -> Result<()> {
        for node in &self.nodes {
            if node.bucket_exists(&self.bucket).await? {
                continue;
            }

            match node.create_bucket(&self.bucket, region).await {
                Ok(()) => {
                    tracing::info!(
                        "Bucket {} created successfully on {}",
                        self.bucket,
                        node.endpoint()
                    );
                }
                Err(error) => {
                    // The bucket may have appeared between the check and
                    // the create.
                    if node.bucket_exists(&self.bucket).await.unwrap_or(false) {
                        tracing::warn!(
                            "Bucket {} appeared on {} during create: {}",
                            self.bucket,
                            node.endpoint(),
                            error
                        );
                    } else {
                        return Err(error);
                    }
                }
            }
        }

        Ok(())
    }
}
