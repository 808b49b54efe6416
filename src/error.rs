//! Error types for Lucerne.

use thiserror::Error;

/// The error type shared by every Lucerne component.
///
/// Looking up a document that does not exist is not an error: lookups return
/// `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum LucerneError {
    /// Storage could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The query string could not be parsed.
    #[error("query syntax error: {0}")]
    QuerySyntax(String),

    /// Another writer session holds the write lock.
    #[error("lock contention: {0}")]
    LockContention(String),

    /// `Append` mode was requested but no index exists yet.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// A segment file failed its format or checksum validation.
    #[error("corrupted index file: {0}")]
    Corrupted(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A query was cancelled before it finished.
    #[error("operation cancelled")]
    Cancelled,

    #[error("index writer is closed")]
    WriterClosed,
}

impl LucerneError {
    pub fn query_syntax(msg: impl Into<String>) -> Self {
        LucerneError::QuerySyntax(msg.into())
    }

    pub fn lock_contention(msg: impl Into<String>) -> Self {
        LucerneError::LockContention(msg.into())
    }

    pub fn corrupted(msg: impl Into<String>) -> Self {
        LucerneError::Corrupted(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        LucerneError::InvalidArgument(msg.into())
    }

    /// Whether the caller can reasonably retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LucerneError::LockContention(_))
    }
}

pub type Result<T> = std::result::Result<T, LucerneError>;
