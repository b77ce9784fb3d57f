//! Streaming operations for Mirio
//!
//! Ingestion (upload) and egress (download) stream handling between the
//! gateway surface and the backend nodes.

pub mod download;
pub mod upload;

pub use download::DownloadOperation;
pub use upload::{UploadOperation, UploadOutcome};
