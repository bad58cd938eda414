//! Error types for the sync module.

use thiserror::Error;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Protocol violation: unexpected, malformed, or unsolicited frame.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Frame exceeds the wire size limit.
    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] weft_store::StoreError),

    /// Message validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] weft_core::ValidationError),

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
