//! # Weft
//!
//! Goal-driven replication of hash-linked message tangles.
//!
//! ## Overview
//!
//! A *tangle* is a DAG of content-addressed messages rooted at one initial
//! message: a linear chain models a feed, a branching one models a reply
//! thread. Peers hold independent, possibly partial copies; weft
//! reconciles them pairwise under per-tangle *retention goals* (`all`, or
//! `newest-<N>` with local trimming), so storage stays bounded even for
//! feeds that are never fully synchronized.
//!
//! ## Key Concepts
//!
//! - **Msg**: immutable, content-addressed; links its causal predecessors.
//! - **Tangle root**: the first message; its hash is the tangle's identity.
//! - **Goal**: how much of a tangle this peer wants to hold.
//! - **Frontier**: the hashes a peer currently holds, with depth metadata.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use weft::{Replicator, ReplicatorConfig};
//! use weft::store::MemoryStore;
//! use weft::core::MsgId;
//!
//! async fn example(conn: Arc<dyn weft::sync::Connection>) {
//!     // The host brings its own store; the in-memory one serves tests.
//!     let replicator = Replicator::new(MemoryStore::new(), ReplicatorConfig::default());
//!
//!     // Declare interest in a tangle.
//!     let root = MsgId::from_hex(
//!         "a8c51fa4fbc287384fbf9adfd5d1744872b1bf72ec2052943bb21a0fa9b6beb5",
//!     )
//!     .unwrap();
//!     replicator.set_goal(root, "newest-50").await.unwrap();
//!
//!     // Hand over a connection from the transport layer and sync.
//!     replicator.attach(conn);
//!     let reports = replicator.initiate().await;
//!     for report in reports {
//!         println!("{}: {} received", report.root, report.received);
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `weft::core` - Core primitives (Msg, MsgId, Goal, ...)
//! - `weft::store` - Storage interface and the in-memory reference store
//! - `weft::sync` - Sessions, coordinator, transport, retention

pub mod error;
pub mod replicator;

// Re-export component crates
pub use weft_core as core;
pub use weft_store as store;
pub use weft_sync as sync;

// Re-export main types for convenience
pub use error::{ReplicatorError, Result};
pub use replicator::{Replicator, ReplicatorConfig};

// Re-export commonly used types
pub use weft_core::{AuthorId, Goal, Msg, MsgBuilder, MsgId};
pub use weft_store::{AddResult, MemoryStore, MsgStore};
pub use weft_sync::{Connection, PeerId, SessionReport, SessionState, SyncConfig};
