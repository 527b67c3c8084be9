//! Error types for rolemend-store.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from either backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (document store).
    #[error("document store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQL execution error (relational store).
    #[error("relational store error: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
