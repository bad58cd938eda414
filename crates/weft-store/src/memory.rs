//! In-memory implementation of the MsgStore trait.
//!
//! This is primarily for testing. It has the semantics a durable backend
//! must provide but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use weft_core::{validate_msg, Msg, MsgId};

use crate::error::Result;
use crate::traits::{AddResult, MsgStore, TangleEntry};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Messages indexed by id.
    msgs: HashMap<MsgId, Msg>,

    /// Tangle index: root -> member ids in insertion order.
    tangles: HashMap<MsgId, Vec<MsgId>>,

    /// Reverse index: member id -> declared root.
    roots: HashMap<MsgId, MsgId>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                msgs: HashMap::new(),
                tangles: HashMap::new(),
                roots: HashMap::new(),
            }),
        }
    }

    /// Number of messages held, across all tangles.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().msgs.len()
    }

    /// Whether the store holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MsgStore for MemoryStore {
    async fn add(&self, msg: &Msg, root: &MsgId) -> Result<AddResult> {
        validate_msg(msg)?;

        let mut inner = self.inner.write().unwrap();
        let id = msg.compute_id();

        if inner.msgs.contains_key(&id) {
            return Ok(AddResult::Duplicate);
        }

        inner.msgs.insert(id, msg.clone());
        inner.tangles.entry(*root).or_default().push(id);
        inner.roots.insert(id, *root);

        Ok(AddResult::Added)
    }

    async fn get(&self, id: &MsgId) -> Result<Option<Msg>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.msgs.get(id).cloned())
    }

    async fn contains(&self, id: &MsgId) -> Result<bool> {
        let inner = self.inner.read().unwrap();
        Ok(inner.msgs.contains_key(id))
    }

    async fn query_by_tangle(&self, root: &MsgId) -> Result<Vec<TangleEntry>> {
        let inner = self.inner.read().unwrap();

        let ids = match inner.tangles.get(root) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };

        let entries = ids
            .iter()
            .filter_map(|id| {
                inner.msgs.get(id).map(|m| TangleEntry {
                    id: *id,
                    author: *m.author(),
                    kind: m.kind().to_string(),
                    depth: m.depth(),
                    prev: m.prev().to_vec(),
                })
            })
            .collect();

        Ok(entries)
    }

    async fn delete(&self, id: &MsgId) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        if inner.msgs.remove(id).is_none() {
            return Ok(());
        }
        if let Some(root) = inner.roots.remove(id) {
            if let Some(ids) = inner.tangles.get_mut(&root) {
                ids.retain(|m| m != id);
            }
        }

        Ok(())
    }
}
