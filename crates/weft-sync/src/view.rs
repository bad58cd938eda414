//! Tangle view: an in-memory index of one tangle as currently held.
//!
//! Built fresh from the store per sync session, never persisted. The DAG
//! is represented as a hash-keyed arena — records point at each other by
//! `MsgId`, never by reference — so shared ancestry and incomplete chains
//! need no special handling.

use std::collections::{HashMap, HashSet};

use weft_core::{AuthorId, Blake3Hash, Goal, MsgId};
use weft_store::{MsgStore, StoreError};

use crate::wire::FrontierEntry;

/// Index record for one held message.
#[derive(Debug, Clone)]
pub struct TangleRecord {
    /// The author/group identifier.
    pub author: AuthorId,
    /// Application type tag.
    pub kind: String,
    /// Carried causal depth.
    pub depth: u64,
    /// Tangle links.
    pub prev: Vec<MsgId>,
}

/// A snapshot view of one tangle.
pub struct TangleView {
    root: MsgId,
    records: HashMap<MsgId, TangleRecord>,
    /// Ids in store insertion order.
    order: Vec<MsgId>,
}

impl TangleView {
    /// Load the view for a tangle from the store.
    ///
    /// The view may be partial and need not be causally closed; it may
    /// even lack the root message itself (root-less ingestion).
    pub async fn load<S: MsgStore + ?Sized>(store: &S, root: MsgId) -> Result<Self, StoreError> {
        let entries = store.query_by_tangle(&root).await?;

        let mut records = HashMap::with_capacity(entries.len());
        let mut order = Vec::with_capacity(entries.len());
        for entry in entries {
            order.push(entry.id);
            records.insert(
                entry.id,
                TangleRecord {
                    author: entry.author,
                    kind: entry.kind,
                    depth: entry.depth,
                    prev: entry.prev,
                },
            );
        }

        Ok(Self { root, records, order })
    }

    /// The tangle's identity.
    pub fn root(&self) -> MsgId {
        self.root
    }

    /// Whether the root message itself is held.
    pub fn has_root(&self) -> bool {
        self.records.contains_key(&self.root)
    }

    /// Number of held messages.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing of the tangle is held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the given message is held.
    pub fn contains(&self, id: &MsgId) -> bool {
        self.records.contains_key(id)
    }

    /// Look up a record.
    pub fn record(&self, id: &MsgId) -> Option<&TangleRecord> {
        self.records.get(id)
    }

    /// Highest depth among held messages (0 when empty).
    pub fn max_depth(&self) -> u64 {
        self.records.values().map(|r| r.depth).max().unwrap_or(0)
    }

    /// The frontier: every held hash with its ordering metadata.
    pub fn frontier(&self) -> Vec<FrontierEntry> {
        self.order
            .iter()
            .filter_map(|id| {
                self.records
                    .get(id)
                    .map(|r| FrontierEntry { id: *id, depth: r.depth })
            })
            .collect()
    }

    /// Messages with no known successor in this view.
    pub fn tips(&self) -> Vec<MsgId> {
        let mut linked: HashSet<MsgId> = HashSet::new();
        for record in self.records.values() {
            linked.extend(record.prev.iter().copied());
        }
        self.order
            .iter()
            .filter(|id| !linked.contains(id))
            .copied()
            .collect()
    }

    /// Held messages falling outside the retention window, oldest first.
    ///
    /// Empty for `Goal::All`. The root message is never included: its hash
    /// is the tangle's identity and is needed to re-identify the tangle in
    /// future sessions.
    pub fn prunable(&self, goal: &Goal) -> Vec<MsgId> {
        let bound = goal.window_bound(self.max_depth());
        if bound == 0 {
            return Vec::new();
        }

        let mut doomed: Vec<(u64, MsgId)> = self
            .records
            .iter()
            .filter(|(id, r)| r.depth < bound && **id != self.root)
            .map(|(id, r)| (r.depth, *id))
            .collect();
        doomed.sort();
        doomed.into_iter().map(|(_, id)| id).collect()
    }

    /// Deterministic digest over the held set.
    ///
    /// Two views of the same tangle have equal digests iff they hold the
    /// same message set, regardless of arrival order.
    pub fn digest(&self) -> Blake3Hash {
        let mut ids: Vec<MsgId> = self.records.keys().copied().collect();
        ids.sort();

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"weft-tangle-digest-v0:");
        hasher.update(&self.root.0);
        for id in ids {
            hasher.update(&id.0);
        }
        Blake3Hash(*hasher.finalize().as_bytes())
    }
}
