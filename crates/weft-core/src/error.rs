//! Error types for weft-core.

use thiserror::Error;

use crate::types::MsgId;

/// Core errors that can occur during message operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid goal spec: {0:?}")]
    InvalidGoal(String),

    #[error("payload hash mismatch: expected {expected}, got {actual}")]
    PayloadHashMismatch { expected: String, actual: String },

    #[error("unsupported message version: {0}")]
    UnsupportedVersion(u8),

    #[error("malformed message: {0}")]
    MalformedMsg(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Validation errors for message structure.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("payload hash does not match header")]
    PayloadHashMismatch,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("content hash mismatch: claimed {claimed}, computed {computed}")]
    IdMismatch { claimed: MsgId, computed: MsgId },

    #[error("tangle links exceed maximum length of 16")]
    TooManyLinks,

    #[error("root message must have depth 0 and no links")]
    MalformedRoot,

    #[error("non-root message at depth {0} must carry at least one link")]
    MissingLinks(u64),

    #[error("duplicate tangle link {0}")]
    DuplicateLink(MsgId),

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::PayloadHashMismatch { .. } => ValidationError::PayloadHashMismatch,
            CoreError::UnsupportedVersion(v) => ValidationError::UnsupportedVersion(v),
            CoreError::MalformedMsg(msg)
            | CoreError::EncodingError(msg)
            | CoreError::DecodingError(msg)
            | CoreError::InvalidGoal(msg) => ValidationError::StructuralError(msg),
        }
    }
}
