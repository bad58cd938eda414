//! Test fixtures and helpers.
//!
//! Common setup code for unit and integration tests: deterministic
//! authors, linear feeds, and branching threads.

use std::ops::Range;

use weft_core::{AuthorId, Msg, MsgBuilder, MsgId};
use weft_store::{MsgStore, StoreError};

/// Derive a deterministic test author from a label.
pub fn author(label: &str) -> AuthorId {
    AuthorId::derive(label)
}

/// Create a tangle root post.
pub fn post(author_label: &str, text: &str) -> Msg {
    MsgBuilder::new(author(author_label), "post")
        .payload(text.as_bytes().to_vec())
        .build()
}

/// Create a reply linking after the given predecessors.
pub fn reply(author_label: &str, preds: &[&Msg], text: &str) -> Msg {
    MsgBuilder::new(author(author_label), "post")
        .after(preds)
        .payload(text.as_bytes().to_vec())
        .build()
}

/// Create a reaction to a message. Reactions reference the tangle purely
/// through their predecessor links and sync like any other message.
pub fn reaction(author_label: &str, target: &Msg, text: &str) -> Msg {
    MsgBuilder::new(author(author_label), "reaction")
        .after(&[target])
        .payload(text.as_bytes().to_vec())
        .build()
}

/// A deterministic linear feed: a root plus `len` chained posts.
pub struct FeedFixture {
    root_id: MsgId,
    msgs: Vec<Msg>,
}

impl FeedFixture {
    /// Build a feed authored by `label` with payloads "m1".."m<len>".
    pub fn new(label: &str, len: usize) -> Self {
        let author = author(label);
        let root = MsgBuilder::new(author, "post")
            .payload(format!("{}-feed", label).into_bytes())
            .build();
        let root_id = root.compute_id();

        let mut msgs = vec![root];
        for i in 0..len {
            let prev = msgs.last().unwrap();
            let m = MsgBuilder::new(author, "post")
                .after(&[prev])
                .payload(format!("m{}", i + 1).into_bytes())
                .build();
            msgs.push(m);
        }
        Self { root_id, msgs }
    }

    /// The tangle identity.
    pub fn root_id(&self) -> MsgId {
        self.root_id
    }

    /// All messages, root first.
    pub fn msgs(&self) -> &[Msg] {
        &self.msgs
    }

    /// The post at 1-indexed feed position ("m3" is `post(3)`).
    pub fn post(&self, n: usize) -> &Msg {
        &self.msgs[n]
    }

    /// Add a slice of the feed to a store. `range` indexes into
    /// [`FeedFixture::msgs`], so `0..3` seeds the root plus m1 and m2.
    pub async fn seed<S: MsgStore + ?Sized>(
        &self,
        store: &S,
        range: Range<usize>,
    ) -> Result<(), StoreError> {
        for m in &self.msgs[range] {
            store.add(m, &self.root_id).await?;
        }
        Ok(())
    }
}

/// Seed a store with whole messages under a root.
pub async fn seed_all<S: MsgStore + ?Sized>(
    store: &S,
    root: &MsgId,
    msgs: &[&Msg],
) -> Result<(), StoreError> {
    for m in msgs {
        store.add(m, root).await?;
    }
    Ok(())
}

/// Payload texts of a tangle's messages, in store insertion order.
///
/// The assertion workhorse: mirrors "which posts does this peer hold, in
/// the order it learned them".
pub async fn texts<S: MsgStore + ?Sized>(
    store: &S,
    root: &MsgId,
) -> Result<Vec<String>, StoreError> {
    let mut out = Vec::new();
    for entry in store.query_by_tangle(root).await? {
        if let Some(msg) = store.get(&entry.id).await? {
            out.push(String::from_utf8_lossy(&msg.payload).into_owned());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_store::MemoryStore;

    #[test]
    fn test_feed_fixture_is_deterministic() {
        let a = FeedFixture::new("carol", 5);
        let b = FeedFixture::new("carol", 5);
        assert_eq!(a.root_id(), b.root_id());
        assert_eq!(
            a.msgs().last().unwrap().compute_id(),
            b.msgs().last().unwrap().compute_id()
        );

        let other = FeedFixture::new("dave", 5);
        assert_ne!(a.root_id(), other.root_id());
    }

    #[test]
    fn test_feed_depths_are_sequential() {
        let feed = FeedFixture::new("carol", 4);
        let depths: Vec<u64> = feed.msgs().iter().map(|m| m.depth()).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_seed_and_texts() {
        let feed = FeedFixture::new("carol", 4);
        let store = MemoryStore::new();
        feed.seed(&store, 0..3).await.unwrap();

        let held = texts(&store, &feed.root_id()).await.unwrap();
        assert_eq!(held, vec!["carol-feed", "m1", "m2"]);
    }

    #[test]
    fn test_thread_helpers() {
        let root = post("alice", "A");
        let b1 = reply("bob", &[&root], "B1");
        let yes = reaction("carol", &b1, "yes");

        assert_eq!(root.depth(), 0);
        assert_eq!(b1.depth(), 1);
        assert_eq!(yes.depth(), 2);
        assert_eq!(yes.kind(), "reaction");
        assert_eq!(yes.prev(), &[b1.compute_id()]);
    }
}
