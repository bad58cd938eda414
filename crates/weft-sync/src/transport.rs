//! Transport abstraction for the sync protocol.
//!
//! The transport collaborator owns authentication, encryption, and real
//! sockets. This core only sees an established duplex frame channel per
//! peer connection. Implementations may run over TCP, WebSockets, or
//! anything else that delivers whole frames.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

use crate::error::{Result, SyncError};

/// Unique identifier for a peer, as established by the transport handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub [u8; 32]);

impl PeerId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a random peer ID.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &hex::encode(self.0)[..16])
    }
}

/// An established, authenticated duplex connection to one peer.
///
/// Frames are delivered whole and in order per direction. A connection
/// that has been closed (locally or by the peer) yields `None` from
/// [`Connection::recv`]; that is the "closed" lifecycle event.
#[async_trait]
pub trait Connection: Send + Sync {
    /// The remote peer's identity.
    fn peer(&self) -> PeerId;

    /// Send one frame to the peer.
    async fn send(&self, frame: Bytes) -> Result<()>;

    /// Receive the next frame. Returns `None` once the connection is
    /// closed and drained.
    async fn recv(&self) -> Option<Bytes>;

    /// Close the connection. Pending frames may still be drained by the
    /// peer; nothing more can be sent.
    async fn close(&self);
}

/// A simple in-memory transport for testing.
///
/// Uses channels to simulate frame passing between two endpoints.
pub mod memory {
    use super::*;
    use tokio::sync::{mpsc, Mutex};

    /// Default channel capacity for a loopback pair.
    const CAPACITY: usize = 64;

    /// Create a connected pair of in-memory endpoints.
    ///
    /// `a` and `b` are the two peers' identities; each endpoint reports
    /// the *other* side from [`Connection::peer`].
    pub fn pair(a: PeerId, b: PeerId) -> (MemoryConnection, MemoryConnection) {
        let (tx_ab, rx_ab) = mpsc::channel(CAPACITY);
        let (tx_ba, rx_ba) = mpsc::channel(CAPACITY);

        let conn_a = MemoryConnection {
            remote: b,
            tx: Mutex::new(Some(tx_ab)),
            rx: Mutex::new(rx_ba),
        };
        let conn_b = MemoryConnection {
            remote: a,
            tx: Mutex::new(Some(tx_ba)),
            rx: Mutex::new(rx_ab),
        };
        (conn_a, conn_b)
    }

    /// One endpoint of an in-memory connection.
    pub struct MemoryConnection {
        remote: PeerId,
        tx: Mutex<Option<mpsc::Sender<Bytes>>>,
        rx: Mutex<mpsc::Receiver<Bytes>>,
    }

    #[async_trait]
    impl Connection for MemoryConnection {
        fn peer(&self) -> PeerId {
            self.remote
        }

        async fn send(&self, frame: Bytes) -> Result<()> {
            let guard = self.tx.lock().await;
            match guard.as_ref() {
                Some(tx) => tx
                    .send(frame)
                    .await
                    .map_err(|_| SyncError::Transport("peer closed connection".into())),
                None => Err(SyncError::Transport("connection closed".into())),
            }
        }

        async fn recv(&self) -> Option<Bytes> {
            self.rx.lock().await.recv().await
        }

        async fn close(&self) {
            // Dropping the sender is the close signal: the peer drains any
            // buffered frames and then observes end-of-stream.
            self.tx.lock().await.take();
        }
    }
}
