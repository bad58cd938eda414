//! MsgStore trait: the narrow interface the sync core consumes.
//!
//! The durable message store is an external collaborator; the sync core
//! only ever talks to it through this trait. The in-memory implementation
//! in [`crate::memory`] exists for tests and examples.

use async_trait::async_trait;
use weft_core::{AuthorId, Msg, MsgId};

use crate::error::Result;

/// Result of adding a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    /// Message was inserted.
    Added,
    /// Message already exists (idempotent - not an error).
    Duplicate,
}

/// Index record for one stored message of a tangle.
///
/// What a tangle-wide query yields: enough to rebuild the link structure
/// without materializing payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TangleEntry {
    /// The message id.
    pub id: MsgId,
    /// The author/group identifier.
    pub author: AuthorId,
    /// Application type tag.
    pub kind: String,
    /// Carried causal depth.
    pub depth: u64,
    /// Tangle links.
    pub prev: Vec<MsgId>,
}

/// The MsgStore trait: async interface for message persistence.
///
/// # Design Notes
///
/// - **Idempotent adds**: Adding the same message twice returns `Duplicate`.
/// - **Root-less tolerance**: A message may be added under a root hash even
///   when the root message or intermediate predecessors are absent locally;
///   the root hash is the tangle's identity whether or not it is held.
/// - **Per-message atomicity**: The sync core treats each call as atomic
///   and never batches transactionally across a whole tangle.
#[async_trait]
pub trait MsgStore: Send + Sync {
    /// Add a message under a claimed tangle root.
    ///
    /// Validates the message structurally and inserts it, tolerating
    /// unknown predecessors.
    async fn add(&self, msg: &Msg, root: &MsgId) -> Result<AddResult>;

    /// Get a message by its content-addressed id.
    async fn get(&self, id: &MsgId) -> Result<Option<Msg>>;

    /// Check if a message exists by id.
    async fn contains(&self, id: &MsgId) -> Result<bool>;

    /// Index records for every held message of a tangle, in insertion
    /// order.
    async fn query_by_tangle(&self, root: &MsgId) -> Result<Vec<TangleEntry>>;

    /// Delete a message. Removing an id that is not held is a no-op.
    async fn delete(&self, id: &MsgId) -> Result<()>;
}
