//! Store error types.

use thiserror::Error;

/// The four error categories callers translate into responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced list, page, or article does not exist.
    NotFound,
    /// Malformed input.
    Validation,
    /// Successor already set, or a forked chain was detected.
    Conflict,
    /// Underlying durable store, transaction, or timeout failure.
    Storage,
}

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Database(_)
            | Self::Timeout { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => ErrorKind::Storage,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

impl From<pagechain_core::Error> for StoreError {
    fn from(e: pagechain_core::Error) -> Self {
        match e {
            pagechain_core::Error::InvalidConfig(msg) => Self::Config(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
