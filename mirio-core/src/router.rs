use crate::registry::NodeRegistry;
use crate::store::NodeStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin selector for read-class operations (get/stat/list).
///
/// The cursor is the only mutable state shared across requests. It is
/// advanced with a single `fetch_add`, so no two concurrent callers can
/// observe the same pre-advance position. There is no health awareness:
/// a down node is still selected in its turn and the failing read is
/// surfaced to the caller.
pub struct ReadRouter {
    registry: Arc<NodeRegistry>,
    cursor: AtomicUsize,
}

impl ReadRouter {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn next_node(&self) -> Arc<dyn NodeStore> {
        let position = self.cursor.fetch_add(1, Ordering::Relaxed) % self.registry.len();
        Arc::clone(self.registry.node(position))
    }
}
