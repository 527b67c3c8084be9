//! Error types for rolemend-engine.

use thiserror::Error;

use rolemend_store::StoreError;

/// All errors that can arise while reconciling.
///
/// Per-action errors are recovered at the engine loop and counted; only a
/// failure to load the team list aborts a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An error from either backing store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A document the store returned could not be decoded into the model.
    #[error("malformed document: {0}")]
    Decode(#[from] serde_json::Error),

    /// The relational mutation failed after the document-store mutation was
    /// already committed. The document store is authoritative and is not
    /// rolled back; a later run resynchronizes the relational side.
    #[error("relational sync failed for document {doc_id} (document store already committed): {source}")]
    PartialSync {
        doc_id: String,
        #[source]
        source: StoreError,
    },
}
