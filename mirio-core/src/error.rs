use thiserror::Error;

pub type Result<T> = std::result::Result<T, MirioError>;

#[derive(Error, Debug)]
pub enum MirioError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("replication incomplete: {failed} of {total} nodes failed ({detail})")]
    PartialReplication {
        failed: usize,
        total: usize,
        detail: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MirioError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
