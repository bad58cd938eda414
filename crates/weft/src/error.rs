//! Error types for the replicator facade.

use thiserror::Error;

use weft_core::CoreError;
use weft_store::StoreError;
use weft_sync::SyncError;

/// Errors that can occur at the replicator API boundary.
#[derive(Debug, Error)]
pub enum ReplicatorError {
    /// Malformed caller input (goal spec, hash). Rejected locally; no
    /// protocol exchange occurs.
    #[error("invalid input: {0}")]
    Input(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Result type for replicator operations.
pub type Result<T> = std::result::Result<T, ReplicatorError>;
