//! Feed replication: linear tangles under `all` and `newest-<N>` goals.

mod common;

use anyhow::Result;

use common::{connect, init_tracing, peer, settle};
use weft::sync::TangleView;
use weft::MsgId;
use weft_testkit::{texts, FeedFixture};

/// Expected payload texts: the feed's root followed by "m<a>".."m<b>".
fn feed_texts(label: &str, range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    let mut out = vec![format!("{}-feed", label)];
    out.extend(range.map(|i| format!("m{}", i)));
    out
}

#[tokio::test]
async fn sync_a_feed_with_goal_all() -> Result<()> {
    init_tracing();
    let feed = FeedFixture::new("carol", 10);
    let root = feed.root_id();

    let alice = peer();
    let bob = peer();
    feed.seed(alice.store().as_ref(), 0..11).await?;
    feed.seed(bob.store().as_ref(), 0..8).await?;

    assert_eq!(
        texts(bob.store().as_ref(), &root).await?,
        feed_texts("carol", 1..=7),
        "bob starts with msgs 1..7 from carol"
    );

    bob.set_goal(root, "all").await?;
    alice.set_goal(root, "all").await?;
    connect(&bob, &alice);

    let reports = bob.initiate().await;
    assert_eq!(reports.len(), 1);
    assert!(reports[0].succeeded());
    settle(&[&alice, &bob]).await;

    assert_eq!(
        texts(bob.store().as_ref(), &root).await?,
        feed_texts("carol", 1..=10),
        "bob has msgs 1..10 from carol"
    );
    assert_eq!(alice.store().len(), 11, "alice is unchanged");
    Ok(())
}

#[tokio::test]
async fn sync_a_feed_with_goal_newest() -> Result<()> {
    init_tracing();
    let feed = FeedFixture::new("carol", 10);
    let root = feed.root_id();

    let alice = peer();
    let bob = peer();
    feed.seed(alice.store().as_ref(), 0..11).await?;
    feed.seed(bob.store().as_ref(), 0..8).await?;

    bob.set_goal(root, "newest-5").await?;
    alice.set_goal(root, "all").await?;
    connect(&bob, &alice);

    let reports = bob.initiate().await;
    assert!(reports[0].succeeded());
    settle(&[&alice, &bob]).await;

    // Bob pulled m8..m10 and trimmed m1..m5; the root survives as the
    // tangle's identity. Nothing older than the window is ever held.
    assert_eq!(
        texts(bob.store().as_ref(), &root).await?,
        feed_texts("carol", 6..=10),
        "bob has msgs 6..10 from carol"
    );
    assert_eq!(alice.store().len(), 11, "alice keeps the full feed");
    Ok(())
}

#[tokio::test]
async fn sync_a_feed_with_goal_newest_but_too_far_behind() -> Result<()> {
    init_tracing();
    let feed = FeedFixture::new("carol", 10);
    let root = feed.root_id();

    let alice = peer();
    let bob = peer();
    feed.seed(alice.store().as_ref(), 0..11).await?;

    // Alice only retains her window to begin with.
    let report = alice.prune(root, 5).await?;
    assert_eq!(report.removed.len(), 5);
    assert_eq!(
        texts(alice.store().as_ref(), &root).await?,
        feed_texts("carol", 6..=10),
        "alice has msgs 6..10 from carol"
    );

    // Bob is far behind the window.
    feed.seed(bob.store().as_ref(), 0..3).await?;
    assert_eq!(
        texts(bob.store().as_ref(), &root).await?,
        feed_texts("carol", 1..=2),
        "bob has msgs 1..2 from carol"
    );

    alice.set_goal(root, "newest-5").await?;
    bob.set_goal(root, "newest-5").await?;
    connect(&bob, &alice);

    let reports = bob.initiate().await;
    assert!(reports[0].succeeded());
    settle(&[&alice, &bob]).await;

    assert_eq!(
        texts(bob.store().as_ref(), &root).await?,
        feed_texts("carol", 6..=10),
        "bob has msgs 6..10 from carol"
    );
    Ok(())
}

#[tokio::test]
async fn both_windowed_peers_converge_to_the_same_window() -> Result<()> {
    init_tracing();
    let feed = FeedFixture::new("carol", 10);
    let root = feed.root_id();

    // Adjacent, non-overlapping halves of the feed; neither holds the root.
    let alice = peer();
    let bob = peer();
    feed.seed(alice.store().as_ref(), 1..6).await?; // m1..m5
    feed.seed(bob.store().as_ref(), 6..11).await?; // m6..m10

    alice.set_goal(root, "newest-5").await?;
    bob.set_goal(root, "newest-5").await?;
    connect(&bob, &alice);

    let reports = bob.initiate().await;
    assert!(reports[0].succeeded());
    settle(&[&alice, &bob]).await;

    // Both converge on the newest five; the stale half is gone and nothing
    // outside either window was accepted.
    let expect: Vec<String> = (6..=10).map(|i| format!("m{}", i)).collect();
    assert_eq!(texts(alice.store().as_ref(), &root).await?, expect);
    assert_eq!(texts(bob.store().as_ref(), &root).await?, expect);

    let view_a = TangleView::load(alice.store().as_ref(), root).await?;
    let view_b = TangleView::load(bob.store().as_ref(), root).await?;
    assert_eq!(view_a.digest(), view_b.digest(), "peers converged");
    Ok(())
}

#[tokio::test]
async fn initiate_again_with_no_new_state_is_a_noop() -> Result<()> {
    init_tracing();
    let feed = FeedFixture::new("carol", 6);
    let root = feed.root_id();

    let alice = peer();
    let bob = peer();
    feed.seed(alice.store().as_ref(), 0..7).await?;

    alice.set_goal(root, "all").await?;
    bob.set_goal(root, "all").await?;
    connect(&bob, &alice);

    let first = bob.initiate().await;
    assert_eq!(first[0].received, 7);
    settle(&[&alice, &bob]).await;

    let digest_before = TangleView::load(bob.store().as_ref(), root).await?.digest();

    let second = bob.initiate().await;
    settle(&[&alice, &bob]).await;

    assert_eq!(second.len(), 1);
    assert!(second[0].succeeded());
    assert_eq!(second[0].received, 0, "nothing transferred");
    assert_eq!(second[0].sent, 0, "nothing transferred");

    let digest_after = TangleView::load(bob.store().as_ref(), root).await?.digest();
    assert_eq!(digest_before, digest_after, "stored set unchanged");
    Ok(())
}

#[tokio::test]
async fn malformed_input_is_rejected_before_any_exchange() -> Result<()> {
    init_tracing();
    let bob = peer();

    // Invalid hash: rejected at the parsing boundary.
    assert!(MsgId::from_hex("definitely-not-a-hash").is_err());
    assert!(MsgId::from_hex("abcd").is_err());

    // Invalid goal spec: rejected locally, nothing registered.
    let root = MsgId::from_bytes([0x77; 32]);
    assert!(bob.set_goal(root, "newest-zero").await.is_err());
    assert!(bob.set_goal(root, "most").await.is_err());
    assert_eq!(bob.goal(&root), None);
    Ok(())
}
