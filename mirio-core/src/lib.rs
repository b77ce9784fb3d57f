//! Mirio Core - replicating gateway over S3-compatible storage nodes
//!
//! One logical object-storage service in front of N independent backend
//! nodes:
//! - every write fans out to all nodes (all-must-succeed, no rollback)
//! - reads, metadata and listings round-robin across nodes
//! - the node set is fixed at startup; no health tracking, no repair

pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod operations;
pub mod registry;
pub mod router;
pub mod store;

pub use coordinator::ReplicationCoordinator;
pub use error::{MirioError, Result};
pub use gateway::{FileMetadata, Gateway};
pub use operations::{DownloadOperation, UploadOperation, UploadOutcome};
pub use registry::NodeRegistry;
pub use router::ReadRouter;
pub use store::{
    ChunkStream, MemoryNodeStore, NodeStore, ObjectStat, S3NodeStore, compute_version_tag,
};
