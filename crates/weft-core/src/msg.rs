//! Msg: the immutable unit of a tangle.
//!
//! A message is content-addressed and never edited; changes are represented
//! as new messages linking back to their causal predecessors.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::canonical_bytes;
use crate::hash::{AuthorId, Blake3Hash};
use crate::types::MsgId;

/// The current message schema version.
pub const MSG_VERSION: u8 = 0;

/// Maximum number of tangle links allowed in a message.
pub const MAX_LINKS: usize = 16;

/// The header of a message, containing all metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgHeader {
    /// Schema version (currently 0).
    pub version: u8,

    /// The author/group identifier (32 bytes).
    pub author: AuthorId,

    /// Application type tag (e.g. "post", "reaction"). Opaque to the sync
    /// core: reconciliation treats every kind identically.
    pub kind: String,

    /// Causal depth inside the declared tangle: 0 for the root,
    /// 1 + max(depth of predecessors) otherwise. Carried in the message so
    /// that windowed retention still works when the predecessors themselves
    /// have been pruned away locally.
    pub depth: u64,

    /// Hashes of causal predecessors within the same tangle.
    /// Empty iff this message is the tangle root.
    pub prev: Vec<MsgId>,

    /// Blake3 hash of the payload bytes.
    pub payload_hash: Blake3Hash,
}

/// A complete message: header + payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    /// The message header.
    pub header: MsgHeader,

    /// The payload bytes (may be ciphertext; opaque to this core).
    pub payload: Bytes,
}

impl Msg {
    /// Compute the message ID (Blake3 hash of canonical bytes).
    pub fn compute_id(&self) -> MsgId {
        let bytes = canonical_bytes(self);
        MsgId(Blake3Hash::hash(&bytes).0)
    }

    /// Get the author identifier.
    pub fn author(&self) -> &AuthorId {
        &self.header.author
    }

    /// Get the type tag.
    pub fn kind(&self) -> &str {
        &self.header.kind
    }

    /// Get the carried causal depth.
    pub fn depth(&self) -> u64 {
        self.header.depth
    }

    /// Get the tangle links.
    pub fn prev(&self) -> &[MsgId] {
        &self.header.prev
    }

    /// Check if this message is a tangle root.
    pub fn is_root(&self) -> bool {
        self.header.depth == 0 && self.header.prev.is_empty()
    }
}

/// Builder for creating messages.
pub struct MsgBuilder {
    author: AuthorId,
    kind: String,
    depth: u64,
    prev: Vec<MsgId>,
    payload: Bytes,
}

impl MsgBuilder {
    /// Start building a message. With no links added, the result is a
    /// tangle root (depth 0).
    pub fn new(author: AuthorId, kind: impl Into<String>) -> Self {
        Self {
            author,
            kind: kind.into(),
            depth: 0,
            prev: Vec::new(),
            payload: Bytes::new(),
        }
    }

    /// Set the causal depth explicitly.
    pub fn depth(mut self, depth: u64) -> Self {
        self.depth = depth;
        self
    }

    /// Add a tangle link by hash. The caller is responsible for setting a
    /// consistent depth; prefer [`MsgBuilder::after`] when the predecessor
    /// messages are at hand.
    pub fn link(mut self, prev: MsgId) -> Self {
        self.prev.push(prev);
        self
    }

    /// Link after the given predecessor messages, deriving the depth as
    /// 1 + the deepest predecessor.
    pub fn after(mut self, preds: &[&Msg]) -> Self {
        for p in preds {
            self.prev.push(p.compute_id());
        }
        self.depth = preds.iter().map(|p| p.depth()).max().map_or(0, |d| d + 1);
        self
    }

    /// Set the payload.
    pub fn payload(mut self, p: impl Into<Bytes>) -> Self {
        self.payload = p.into();
        self
    }

    /// Build the message.
    pub fn build(self) -> Msg {
        let payload_hash = Blake3Hash::hash(&self.payload);

        let header = MsgHeader {
            version: MSG_VERSION,
            author: self.author,
            kind: self.kind,
            depth: self.depth,
            prev: self.prev,
            payload_hash,
        };

        Msg {
            header,
            payload: self.payload,
        }
    }
}
