//! Sync session: one tangle's exchange with one peer.
//!
//! A session lives for a single reconciliation round on one connection.
//! Both ends run the same state machine:
//!
//! ```text
//! Idle -> FrontierExchanged -> Transferring -> Done
//!                                          \-> Failed
//! ```
//!
//! After announcing frontiers, the send and receive halves run
//! concurrently: a session streams everything the peer is missing while
//! ingesting what it is missing itself, and each direction finishes with
//! an empty done sentinel. Completion is signaled by the sentinel, never
//! by closing the connection, so sibling sessions on the same connection
//! are unaffected.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use weft_core::{canonical_bytes, decode_msg, validate_claimed, Goal, MsgId};
use weft_store::{AddResult, MsgStore};

use crate::error::{Result, SyncError};
use crate::prune;
use crate::reconcile::reconcile;
use crate::transport::PeerId;
use crate::view::TangleView;
use crate::wire::{Frame, Packet};

/// Configuration for sync behavior.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Whether to validate incoming messages before storing.
    pub validate_incoming: bool,
    /// Whether a `newest-<N>` goal is enforced locally once a session
    /// completes, trimming messages that fell out of the window.
    pub enforce_window: bool,
    /// Capacity of a session's incoming frame channel.
    pub inbox_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            validate_incoming: true,
            enforce_window: true,
            inbox_capacity: 256,
        }
    }
}

/// Protocol state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, frontier not yet exchanged.
    Idle,
    /// Both frontiers seen, plan computed.
    FrontierExchanged,
    /// Streaming data frames in either direction.
    Transferring,
    /// Both done sentinels exchanged.
    Done,
    /// Transport error or protocol violation.
    Failed,
}

/// Result of one sync session.
#[derive(Debug)]
pub struct SessionReport {
    /// The tangle that was synced.
    pub root: MsgId,
    /// The peer it was synced with.
    pub peer: PeerId,
    /// Final protocol state.
    pub state: SessionState,
    /// Messages sent to the peer.
    pub sent: usize,
    /// Messages received and stored.
    pub received: usize,
    /// Messages received that were already held.
    pub duplicates: usize,
    /// Messages dropped (validation or store failure).
    pub invalid: usize,
    /// Messages trimmed by post-sync window enforcement.
    pub pruned: usize,
    /// The failure, if the session failed.
    pub error: Option<SyncError>,
}

impl SessionReport {
    fn new(root: MsgId, peer: PeerId) -> Self {
        Self {
            root,
            peer,
            state: SessionState::Idle,
            sent: 0,
            received: 0,
            duplicates: 0,
            invalid: 0,
            pruned: 0,
            error: None,
        }
    }

    /// Whether the session ran to completion.
    pub fn succeeded(&self) -> bool {
        self.state == SessionState::Done
    }
}

/// One tangle's sync exchange over one connection.
pub struct SyncSession<S> {
    root: MsgId,
    peer: PeerId,
    goal: Option<Goal>,
    store: Arc<S>,
    outbox: mpsc::Sender<Packet>,
    inbox: mpsc::Receiver<Frame>,
    config: SyncConfig,
}

impl<S: MsgStore> SyncSession<S> {
    /// Create a session for a (connection, root) pair.
    ///
    /// `goal` is this side's registered goal (`None` = no interest: the
    /// session requests nothing but still serves the peer). `outbox` is
    /// the connection's writer channel; `inbox` receives this tangle's
    /// frames as demultiplexed by the connection reader.
    pub fn new(
        root: MsgId,
        peer: PeerId,
        goal: Option<Goal>,
        store: Arc<S>,
        outbox: mpsc::Sender<Packet>,
        inbox: mpsc::Receiver<Frame>,
        config: SyncConfig,
    ) -> Self {
        Self {
            root,
            peer,
            goal,
            store,
            outbox,
            inbox,
            config,
        }
    }

    /// Run the session to completion.
    ///
    /// Never panics the surrounding task: failures are folded into the
    /// report with `state == Failed`. A failed session leaves the store
    /// with a valid, if incomplete, subset.
    pub async fn run(self) -> SessionReport {
        let SyncSession {
            root,
            peer,
            goal,
            store,
            outbox,
            mut inbox,
            config,
        } = self;

        let mut report = SessionReport::new(root, peer);
        match drive(root, peer, goal, &store, &outbox, &mut inbox, &config, &mut report).await {
            Ok(()) => {
                report.state = SessionState::Done;
                tracing::debug!(
                    %root, %peer,
                    sent = report.sent,
                    received = report.received,
                    "session done"
                );
            }
            Err(e) => {
                tracing::warn!(%root, %peer, error = %e, "session failed");
                report.state = SessionState::Failed;
                report.error = Some(e);
            }
        }
        report
    }
}

#[allow(clippy::too_many_arguments)]
async fn drive<S: MsgStore>(
    root: MsgId,
    peer: PeerId,
    goal: Option<Goal>,
    store: &Arc<S>,
    outbox: &mpsc::Sender<Packet>,
    inbox: &mut mpsc::Receiver<Frame>,
    config: &SyncConfig,
    report: &mut SessionReport,
) -> Result<()> {
    // Announce our frontier and goal.
    let view = TangleView::load(&**store, root).await?;
    tracing::debug!(%root, %peer, held = view.len(), "announcing frontier");
    send_frame(
        outbox,
        root,
        Frame::Frontier {
            goal,
            entries: view.frontier(),
        },
    )
    .await?;

    // Wait for the peer's frontier.
    let (remote_goal, remote_entries) = match inbox.recv().await {
        Some(Frame::Frontier { goal, entries }) => (goal, entries),
        Some(frame) => {
            return Err(SyncError::Protocol(format!(
                "expected frontier, got {}",
                frame.tag()
            )))
        }
        None => {
            return Err(SyncError::Transport(
                "connection closed before frontier exchange".into(),
            ))
        }
    };
    report.state = SessionState::FrontierExchanged;

    let plan = reconcile(&view, goal, &remote_entries, remote_goal);
    report.state = SessionState::Transferring;
    tracing::debug!(
        %root, %peer,
        to_send = plan.to_send.len(),
        to_request = plan.to_request.len(),
        "transferring"
    );

    // Stream our side and ingest theirs concurrently. Bounded channels in
    // both directions mean a sequential send-then-receive could wedge on a
    // large bidirectional transfer.
    let expected: HashSet<MsgId> = plan.to_request.iter().copied().collect();
    let (sent, stats) = tokio::try_join!(
        send_half(&**store, outbox, root, &plan.to_send),
        recv_half(&**store, inbox, root, expected, config.validate_incoming),
    )?;

    report.sent = sent;
    report.received = stats.received;
    report.duplicates = stats.duplicates;
    report.invalid = stats.invalid;

    // A windowed goal is enforced once transfer completes: what fell out
    // of the window locally is deleted.
    if config.enforce_window {
        if let Some(Goal::Newest(n)) = goal {
            let trimmed = prune::prune(&**store, root, n).await?;
            report.pruned = trimmed.removed.len();
        }
    }

    Ok(())
}

async fn send_frame(outbox: &mpsc::Sender<Packet>, root: MsgId, frame: Frame) -> Result<()> {
    outbox
        .send(Packet::new(root, frame))
        .await
        .map_err(|_| SyncError::Transport("connection writer gone".into()))
}

async fn send_half<S: MsgStore>(
    store: &S,
    outbox: &mpsc::Sender<Packet>,
    root: MsgId,
    to_send: &[MsgId],
) -> Result<usize> {
    let mut sent = 0;
    for id in to_send {
        // A message can disappear between reconciliation and fetch (e.g. a
        // concurrent prune); skip it rather than failing the session.
        if let Some(msg) = store.get(id).await? {
            let bytes = canonical_bytes(&msg);
            send_frame(outbox, root, Frame::Data { id: *id, bytes: bytes.into() }).await?;
            sent += 1;
        }
    }
    send_frame(outbox, root, Frame::Done).await?;
    Ok(sent)
}

struct RecvStats {
    received: usize,
    duplicates: usize,
    invalid: usize,
}

async fn recv_half<S: MsgStore>(
    store: &S,
    inbox: &mut mpsc::Receiver<Frame>,
    root: MsgId,
    mut expected: HashSet<MsgId>,
    validate: bool,
) -> Result<RecvStats> {
    let mut stats = RecvStats {
        received: 0,
        duplicates: 0,
        invalid: 0,
    };

    loop {
        match inbox.recv().await {
            None => {
                return Err(SyncError::Transport(
                    "connection closed mid-transfer".into(),
                ))
            }
            Some(Frame::Done) => break,
            Some(Frame::Frontier { .. }) => {
                return Err(SyncError::Protocol(
                    "unexpected frontier during transfer".into(),
                ))
            }
            Some(Frame::Data { id, bytes }) => {
                if !expected.remove(&id) {
                    return Err(SyncError::Protocol(format!(
                        "unsolicited message {}",
                        id
                    )));
                }

                let msg = match decode_msg(&bytes) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::warn!(%root, %id, error = %e, "dropping undecodable message");
                        stats.invalid += 1;
                        continue;
                    }
                };
                if validate {
                    if let Err(e) = validate_claimed(&msg, &id) {
                        tracing::warn!(%root, %id, error = %e, "dropping invalid message");
                        stats.invalid += 1;
                        continue;
                    }
                }

                match store.add(&msg, &root).await {
                    Ok(AddResult::Added) => stats.received += 1,
                    Ok(AddResult::Duplicate) => stats.duplicates += 1,
                    Err(e) => {
                        // One bad message does not fail the session.
                        tracing::warn!(%root, %id, error = %e, "store rejected message");
                        stats.invalid += 1;
                    }
                }
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{AuthorId, Msg, MsgBuilder};
    use weft_store::MemoryStore;

    /// Wire two sessions back to back: packets leaving one inbox-feed the
    /// other, as the connection reader would.
    fn pump(mut from: mpsc::Receiver<Packet>, to: mpsc::Sender<Frame>) {
        tokio::spawn(async move {
            while let Some(packet) = from.recv().await {
                if to.send(packet.frame).await.is_err() {
                    break;
                }
            }
        });
    }

    fn feed(n: usize) -> (MsgId, Vec<Msg>) {
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
        (root_id, msgs)
    }

    async fn seed(store: &MemoryStore, root: &MsgId, msgs: &[Msg]) {
        for m in msgs {
            store.add(m, root).await.unwrap();
        }
    }

    fn session_pair(
        root: MsgId,
        goal_a: Option<Goal>,
        goal_b: Option<Goal>,
        store_a: Arc<MemoryStore>,
        store_b: Arc<MemoryStore>,
    ) -> (SyncSession<MemoryStore>, SyncSession<MemoryStore>) {
        let peer_a = PeerId::from_bytes([0xAA; 32]);
        let peer_b = PeerId::from_bytes([0xBB; 32]);

        let (out_a, wire_ab) = mpsc::channel(64);
        let (out_b, wire_ba) = mpsc::channel(64);
        let (in_a_tx, in_a_rx) = mpsc::channel(256);
        let (in_b_tx, in_b_rx) = mpsc::channel(256);

        pump(wire_ab, in_b_tx);
        pump(wire_ba, in_a_tx);

        let config = SyncConfig::default();
        let a = SyncSession::new(root, peer_b, goal_a, store_a, out_a, in_a_rx, config.clone());
        let b = SyncSession::new(root, peer_a, goal_b, store_b, out_b, in_b_rx, config);
        (a, b)
    }

    #[tokio::test]
    async fn test_both_all_reach_union() {
        let (root_id, msgs) = feed(10);
        let store_a = Arc::new(MemoryStore::new());
        let store_b = Arc::new(MemoryStore::new());
        seed(&store_a, &root_id, &msgs[..8]).await;
        seed(&store_b, &root_id, &msgs).await;

        let (a, b) = session_pair(
            root_id,
            Some(Goal::All),
            Some(Goal::All),
            Arc::clone(&store_a),
            Arc::clone(&store_b),
        );
        let (ra, rb) = tokio::join!(a.run(), b.run());

        assert!(ra.succeeded(), "a failed: {:?}", ra.error);
        assert!(rb.succeeded(), "b failed: {:?}", rb.error);
        assert_eq!(ra.received, 3);
        assert_eq!(rb.sent, 3);
        assert_eq!(store_a.len(), 11);
        assert_eq!(store_b.len(), 11);
    }

    #[tokio::test]
    async fn test_windowed_side_trims_to_window() {
        let (root_id, msgs) = feed(10);
        let store_a = Arc::new(MemoryStore::new());
        let store_b = Arc::new(MemoryStore::new());
        seed(&store_a, &root_id, &msgs[..8]).await; // root + m1..m7
        seed(&store_b, &root_id, &msgs).await;

        let (a, b) = session_pair(
            root_id,
            Some(Goal::Newest(5)),
            Some(Goal::All),
            Arc::clone(&store_a),
            Arc::clone(&store_b),
        );
        let (ra, rb) = tokio::join!(a.run(), b.run());

        assert!(ra.succeeded() && rb.succeeded());
        // Pulled m8..m10, trimmed m1..m5; root stays.
        assert_eq!(ra.received, 3);
        assert_eq!(ra.pruned, 5);
        assert_eq!(store_a.len(), 6);
        assert!(store_a.contains(&root_id).await.unwrap());
        for m in &msgs[6..] {
            assert!(store_a.contains(&m.compute_id()).await.unwrap());
        }
        for m in &msgs[1..6] {
            assert!(!store_a.contains(&m.compute_id()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_no_interest_responder_still_serves() {
        let (root_id, msgs) = feed(3);
        let store_a = Arc::new(MemoryStore::new());
        let store_b = Arc::new(MemoryStore::new());
        seed(&store_b, &root_id, &msgs).await;

        // Only a registered a goal; b serves from an unregistered tangle.
        let (a, b) = session_pair(
            root_id,
            Some(Goal::All),
            None,
            Arc::clone(&store_a),
            Arc::clone(&store_b),
        );
        let (ra, rb) = tokio::join!(a.run(), b.run());

        assert!(ra.succeeded() && rb.succeeded());
        assert_eq!(store_a.len(), 4);
        assert_eq!(rb.received, 0);
        assert_eq!(store_b.len(), 4);
    }

    #[tokio::test]
    async fn test_unsolicited_data_fails_session() {
        let (root_id, msgs) = feed(1);
        let store = Arc::new(MemoryStore::new());

        let peer = PeerId::random();
        let (outbox, mut wire) = mpsc::channel(64);
        let (inbox_tx, inbox_rx) = mpsc::channel(256);

        let session = SyncSession::new(
            root_id,
            peer,
            Some(Goal::All),
            Arc::clone(&store),
            outbox,
            inbox_rx,
            SyncConfig::default(),
        );
        let handle = tokio::spawn(session.run());

        // Swallow the session's own frontier.
        let announced = wire.recv().await.unwrap();
        assert!(matches!(announced.frame, Frame::Frontier { .. }));

        // Announce an empty frontier, then push data that was never offered.
        inbox_tx
            .send(Frame::Frontier { goal: Some(Goal::All), entries: vec![] })
            .await
            .unwrap();
        inbox_tx
            .send(Frame::Data {
                id: msgs[0].compute_id(),
                bytes: canonical_bytes(&msgs[0]).into(),
            })
            .await
            .unwrap();

        let report = handle.await.unwrap();
        assert_eq!(report.state, SessionState::Failed);
        assert!(matches!(report.error, Some(SyncError::Protocol(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_message_dropped_session_continues() {
        let (root_id, msgs) = feed(2);
        let store = Arc::new(MemoryStore::new());

        let peer = PeerId::random();
        let (outbox, mut wire) = mpsc::channel(64);
        let (inbox_tx, inbox_rx) = mpsc::channel(256);

        let session = SyncSession::new(
            root_id,
            peer,
            Some(Goal::All),
            Arc::clone(&store),
            outbox,
            inbox_rx,
            SyncConfig::default(),
        );
        let handle = tokio::spawn(session.run());
        let _ = wire.recv().await.unwrap();

        let good = &msgs[0];
        let bad = &msgs[1];
        inbox_tx
            .send(Frame::Frontier {
                goal: Some(Goal::All),
                entries: vec![
                    crate::wire::FrontierEntry { id: good.compute_id(), depth: good.depth() },
                    crate::wire::FrontierEntry { id: bad.compute_id(), depth: bad.depth() },
                ],
            })
            .await
            .unwrap();
        // Offered hash with bytes that do not hash to it.
        inbox_tx
            .send(Frame::Data {
                id: bad.compute_id(),
                bytes: canonical_bytes(good).into(),
            })
            .await
            .unwrap();
        inbox_tx
            .send(Frame::Data {
                id: good.compute_id(),
                bytes: canonical_bytes(good).into(),
            })
            .await
            .unwrap();
        inbox_tx.send(Frame::Done).await.unwrap();

        let report = handle.await.unwrap();
        assert!(report.succeeded());
        assert_eq!(report.received, 1);
        assert_eq!(report.invalid, 1);
        assert!(store.contains(&good.compute_id()).await.unwrap());
        assert!(!store.contains(&bad.compute_id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_connection_drop_fails_session() {
        let (root_id, _msgs) = feed(1);
        let store = Arc::new(MemoryStore::new());

        let (outbox, wire) = mpsc::channel(64);
        let (inbox_tx, inbox_rx) = mpsc::channel(256);

        let session = SyncSession::new(
            root_id,
            PeerId::random(),
            Some(Goal::All),
            store,
            outbox,
            inbox_rx,
            SyncConfig::default(),
        );

        // Drop both ends of the "connection" before the peer answers.
        drop(inbox_tx);
        drop(wire);

        let report = session.run().await;
        assert_eq!(report.state, SessionState::Failed);
    }
}
