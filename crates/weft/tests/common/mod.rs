//! Shared setup for integration tests: two-peer harness over the
//! in-memory transport.

use std::sync::Arc;

use weft::sync::transport::memory;
use weft::{MemoryStore, PeerId, Replicator, ReplicatorConfig};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A fresh peer over an empty in-memory store.
pub fn peer() -> Replicator<MemoryStore> {
    Replicator::new(MemoryStore::new(), ReplicatorConfig::default())
}

/// Wire two peers together with an in-memory duplex connection.
pub fn connect(a: &Replicator<MemoryStore>, b: &Replicator<MemoryStore>) {
    let (conn_a, conn_b) = memory::pair(PeerId::random(), PeerId::random());
    a.attach(Arc::new(conn_a));
    b.attach(Arc::new(conn_b));
}

/// Wait until every given peer has no session in flight, initiator or
/// responder.
pub async fn settle(peers: &[&Replicator<MemoryStore>]) {
    for p in peers {
        p.wait_idle().await;
    }
}
