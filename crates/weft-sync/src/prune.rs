//! Retention enforcement: trimming a tangle to its window.

use weft_core::{Goal, MsgId};
use weft_store::MsgStore;

use crate::error::Result;
use crate::view::TangleView;

/// Result of a prune pass.
#[derive(Debug, Clone)]
pub struct PruneReport {
    /// The tangle that was trimmed.
    pub root: MsgId,
    /// Ids deleted, oldest first.
    pub removed: Vec<MsgId>,
    /// Messages remaining after the pass.
    pub remaining: usize,
}

/// Delete every message of the tangle's feed backbone older than the
/// `keep` most recent.
///
/// The root message is never deleted even when it falls outside the
/// numeric window: its hash is the tangle's identity and is needed to
/// re-identify the tangle in future sessions. Runs synchronously with
/// respect to its caller and is independent of any in-flight session.
pub async fn prune<S: MsgStore + ?Sized>(
    store: &S,
    root: MsgId,
    keep: u64,
) -> Result<PruneReport> {
    let view = TangleView::load(store, root).await?;
    let doomed = view.prunable(&Goal::Newest(keep));

    for id in &doomed {
        store.delete(id).await?;
    }

    if !doomed.is_empty() {
        tracing::debug!(%root, removed = doomed.len(), keep, "pruned tangle");
    }

    Ok(PruneReport {
        root,
        remaining: view.len() - doomed.len(),
        removed: doomed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{AuthorId, Msg, MsgBuilder};
    use weft_store::MemoryStore;

    async fn seed_feed(store: &MemoryStore, n: usize) -> (MsgId, Vec<Msg>) {
        let author = AuthorId::derive("carol");
        let root = MsgBuilder::new(author, "post").payload(b"r".to_vec()).build();
        let root_id = root.compute_id();
        let mut msgs = vec![root];
        for i in 0..n {
            let prev = msgs.last().unwrap();
            let m = MsgBuilder::new(author, "post")
                .after(&[prev])
                .payload(format!("m{}", i + 1).into_bytes())
                .build();
            msgs.push(m);
        }
        for m in &msgs {
            store.add(m, &root_id).await.unwrap();
        }
        (root_id, msgs)
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let store = MemoryStore::new();
        let (root_id, msgs) = seed_feed(&store, 10).await;

        let report = prune(&store, root_id, 5).await.unwrap();

        assert_eq!(report.removed.len(), 5);
        assert_eq!(report.remaining, 6); // root + m6..m10

        assert!(store.contains(&root_id).await.unwrap());
        for m in &msgs[6..] {
            assert!(store.contains(&m.compute_id()).await.unwrap());
        }
        for m in &msgs[1..6] {
            assert!(!store.contains(&m.compute_id()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_prune_root_always_survives() {
        let store = MemoryStore::new();
        let (root_id, _msgs) = seed_feed(&store, 10).await;

        prune(&store, root_id, 1).await.unwrap();

        assert!(store.contains(&root_id).await.unwrap());
        let entries = store.query_by_tangle(&root_id).await.unwrap();
        assert_eq!(entries.len(), 2); // root + the newest message
    }

    #[tokio::test]
    async fn test_prune_window_larger_than_tangle() {
        let store = MemoryStore::new();
        let (root_id, _msgs) = seed_feed(&store, 3).await;

        let report = prune(&store, root_id, 100).await.unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.remaining, 4);
    }

    #[tokio::test]
    async fn test_prune_unknown_tangle_is_noop() {
        let store = MemoryStore::new();
        let report = prune(&store, MsgId::from_bytes([0x42; 32]), 5)
            .await
            .unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.remaining, 0);
    }

    #[tokio::test]
    async fn test_prune_twice_is_idempotent() {
        let store = MemoryStore::new();
        let (root_id, _msgs) = seed_feed(&store, 10).await;

        prune(&store, root_id, 5).await.unwrap();
        let second = prune(&store, root_id, 5).await.unwrap();
        assert!(second.removed.is_empty());
        assert_eq!(second.remaining, 6);
    }
}
