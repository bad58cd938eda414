//! Replication coordinator: fans sessions out across tangles and
//! connections.
//!
//! Each attached connection gets a writer task (draining a shared outbox
//! of packets) and a reader task (demultiplexing incoming packets to the
//! owning session by tangle root, spawning a responder session when a
//! frontier arrives for a root nobody is serving yet). `initiate` starts
//! an initiator session per (registered root, live connection) pair.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use weft_core::{Goal, MsgId};
use weft_store::MsgStore;

use crate::registry::GoalRegistry;
use crate::session::{SessionReport, SyncConfig, SyncSession};
use crate::transport::{Connection, PeerId};
use crate::wire::{Frame, Packet};

/// Live session table, shared with session cleanup closures.
struct SessionTable {
    active: Mutex<HashMap<(PeerId, MsgId), mpsc::Sender<Frame>>>,
    idle: Notify,
}

impl SessionTable {
    fn new() -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            idle: Notify::new(),
        }
    }

    fn remove(&self, peer: &PeerId, root: &MsgId) {
        self.active.lock().unwrap().remove(&(*peer, *root));
        self.idle.notify_waiters();
    }

    fn remove_peer(&self, peer: &PeerId) {
        self.active.lock().unwrap().retain(|(p, _), _| p != peer);
        self.idle.notify_waiters();
    }

    fn is_empty(&self) -> bool {
        self.active.lock().unwrap().is_empty()
    }
}

/// Handle to one attached connection.
struct ConnHandle {
    outbox: mpsc::Sender<Packet>,
}

/// Coordinates sync sessions across connections and tangles.
pub struct Coordinator<S> {
    store: Arc<S>,
    registry: Arc<GoalRegistry>,
    config: SyncConfig,
    conns: Mutex<HashMap<PeerId, ConnHandle>>,
    sessions: Arc<SessionTable>,
}

impl<S: MsgStore + 'static> Coordinator<S> {
    /// Create a coordinator over the given store and goal registry.
    pub fn new(store: Arc<S>, registry: Arc<GoalRegistry>, config: SyncConfig) -> Self {
        Self {
            store,
            registry,
            config,
            conns: Mutex::new(HashMap::new()),
            sessions: Arc::new(SessionTable::new()),
        }
    }

    /// Register a live connection (the transport's "connected" event) and
    /// start serving it.
    pub fn attach(self: &Arc<Self>, conn: Arc<dyn Connection>) {
        let peer = conn.peer();
        let (outbox, mut outbox_rx) = mpsc::channel::<Packet>(64);

        self.conns
            .lock()
            .unwrap()
            .insert(peer, ConnHandle { outbox });
        tracing::debug!(%peer, "connection attached");

        // Writer: serialize and send everything the sessions produce.
        let writer_conn = Arc::clone(&conn);
        tokio::spawn(async move {
            while let Some(packet) = outbox_rx.recv().await {
                let bytes = match packet.encode() {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping unencodable packet");
                        continue;
                    }
                };
                if writer_conn.send(bytes).await.is_err() {
                    break;
                }
            }
        });

        // Reader: demultiplex packets to sessions by root.
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match conn.recv().await {
                    Some(bytes) => match Packet::decode(&bytes) {
                        Ok(packet) => coordinator.route(peer, packet).await,
                        Err(e) => {
                            tracing::warn!(%peer, error = %e, "undecodable packet, closing connection");
                            conn.close().await;
                            break;
                        }
                    },
                    None => break,
                }
            }
            coordinator.drop_connection(peer);
        });
    }

    /// Route one incoming packet to its session, spawning a responder for
    /// a frontier aimed at a root nobody is serving yet.
    async fn route(&self, peer: PeerId, packet: Packet) {
        let Packet { root, frame } = packet;

        let sender = {
            let active = self.sessions.active.lock().unwrap();
            active.get(&(peer, root)).cloned()
        };

        let frame = match sender {
            Some(tx) => match tx.send(frame).await {
                Ok(()) => return,
                // The session just finished; a frontier here is the peer
                // opening a fresh round. Clear the stale entry so a
                // responder can take its place.
                Err(mpsc::error::SendError(frame)) => {
                    self.sessions.remove(&peer, &root);
                    frame
                }
            },
            None => frame,
        };

        if matches!(frame, Frame::Frontier { .. }) {
            let goal = self.registry.goal_for(&root);
            tracing::debug!(%peer, %root, "spawning responder session");
            self.spawn_session(peer, root, goal, Some(frame));
        } else {
            tracing::debug!(%peer, %root, tag = frame.tag(), "stray frame dropped");
        }
    }

    /// Spawn a session for (peer, root) unless one is already in flight.
    fn spawn_session(
        &self,
        peer: PeerId,
        root: MsgId,
        goal: Option<Goal>,
        first_frame: Option<Frame>,
    ) -> Option<JoinHandle<SessionReport>> {
        let outbox = {
            let conns = self.conns.lock().unwrap();
            conns.get(&peer)?.outbox.clone()
        };

        let (tx, rx) = mpsc::channel(self.config.inbox_capacity);
        let racing = {
            let mut active = self.sessions.active.lock().unwrap();
            match active.get(&(peer, root)) {
                Some(existing) => Some(existing.clone()),
                None => {
                    active.insert((peer, root), tx.clone());
                    None
                }
            }
        };
        if let Some(existing) = racing {
            // Lost the race against a session spawned in between (e.g. both
            // peers initiated at once); its inbox must still see this frame.
            if let Some(frame) = first_frame {
                if existing.try_send(frame).is_err() {
                    tracing::warn!(%peer, %root, "dropped frame for racing session");
                }
            }
            return None;
        }
        if let Some(frame) = first_frame {
            // The inbox was just created; capacity cannot be exhausted.
            let _ = tx.try_send(frame);
        }

        let session = SyncSession::new(
            root,
            peer,
            goal,
            Arc::clone(&self.store),
            outbox,
            rx,
            self.config.clone(),
        );
        let table = Arc::clone(&self.sessions);
        Some(tokio::spawn(async move {
            let report = session.run().await;
            table.remove(&peer, &root);
            report
        }))
    }

    /// Start a sync round: one initiator session per registered tangle and
    /// live connection. Idempotent — pairs with an in-flight session are
    /// skipped, so repeated calls never duplicate work.
    ///
    /// Awaits the initiator-side sessions and returns their reports; a
    /// failed session's report is the caller's retry signal (nothing is
    /// retried here).
    pub async fn initiate(&self) -> Vec<SessionReport> {
        let goals = self.registry.roots();
        let peers: Vec<PeerId> = self.conns.lock().unwrap().keys().copied().collect();

        let mut handles = Vec::new();
        for (root, goal) in goals {
            for peer in &peers {
                if let Some(handle) = self.spawn_session(*peer, root, Some(goal), None) {
                    handles.push(handle);
                }
            }
        }
        tracing::debug!(sessions = handles.len(), "sync round initiated");

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "session task panicked"),
            }
        }
        reports
    }

    /// Wait until no session (initiator or responder) is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.sessions.idle.notified();
            if self.sessions.is_empty() {
                return;
            }
            notified.await;
        }
    }

    /// Peers with a live connection.
    pub fn peers(&self) -> Vec<PeerId> {
        self.conns.lock().unwrap().keys().copied().collect()
    }

    /// Tear down state for a closed connection: every session on it fails,
    /// sessions on other connections are untouched.
    fn drop_connection(&self, peer: PeerId) {
        self.conns.lock().unwrap().remove(&peer);
        self.sessions.remove_peer(&peer);
        tracing::debug!(%peer, "connection closed");
    }
}
