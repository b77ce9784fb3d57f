use crate::registry::NodeRegistry;
use crate::{MirioError, Result};
use bytes::Bytes;
use futures_util::future::join_all;
use std::sync::Arc;

/// Fans a single logical write or delete out to every node in the
/// registry concurrently and aggregates the result.
///
/// Success requires all nodes to succeed; there is no quorum. When a
/// subset fails, the nodes that succeeded keep their copies - there is
/// no compensating delete or rollback, so a failed write can leave
/// divergent replicas behind. The error names the failing nodes so an
/// operator can reconcile.
pub struct ReplicationCoordinator {
    registry: Arc<NodeRegistry>,
}

impl ReplicationCoordinator {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }

    /// Writes the object to every node. All puts share the same
    /// read-only buffer (`Bytes` clones are reference-counted views).
    pub async fn write(&self, name: &str, data: Bytes) -> Result<()> {
        let bucket = self.registry.bucket();

        let puts = self.registry.nodes().iter().map(|node| {
            let node = Arc::clone(node);
            let data = data.clone();
            async move {
                node.put(bucket, name, data)
                    .await
                    .map_err(|error| (node.endpoint().to_string(), error))
            }
        });

        let results = join_all(puts).await;
        self.aggregate("write", name, results)
    }

    /// Deletes the object from every node, same all-must-succeed fan-out
    /// as `write`.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let bucket = self.registry.bucket();

        let deletes = self.registry.nodes().iter().map(|node| {
            let node = Arc::clone(node);
            async move {
                node.delete(bucket, name)
                    .await
                    .map_err(|error| (node.endpoint().to_string(), error))
            }
        });

        let results = join_all(deletes).await;

        // Only deletes can see NotFound from a node (puts never report it).
        // Every node reporting NotFound means the object was never there,
        // not that replication broke.
        if !results.is_empty()
            && results
                .iter()
                .all(|result| matches!(result, Err((_, error)) if error.is_not_found()))
        {
            return Err(MirioError::NotFound(name.to_string()));
        }

        self.aggregate("delete", name, results)
    }

    fn aggregate(
        &self,
        operation: &str,
        name: &str,
        results: Vec<std::result::Result<(), (String, MirioError)>>,
    ) -> Result<()> {
        let total = results.len();
        let failures: Vec<(String, MirioError)> =
            results.into_iter().filter_map(|result| result.err()).collect();

        if failures.is_empty() {
            tracing::debug!("{} of {} replicated to {} nodes", operation, name, total);
            return Ok(());
        }

        let detail = failures
            .iter()
            .map(|(endpoint, error)| format!("{}: {}", endpoint, error))
            .collect::<Vec<_>>()
            .join("; ");

        tracing::warn!(
            "{} of {} failed on {}/{} nodes: {}",
            operation,
            name,
            failures.len(),
            total,
            detail
        );

        Err(MirioError::PartialReplication {
            failed: failures.len(),
            total,
            detail,
        })
    }
}
