//! # Weft Sync
//!
//! Tangle replication: reconciling hash-linked message DAGs between peers
//! under per-tangle retention goals.
//!
//! ## Overview
//!
//! Each peer holds an append-only store of content-addressed messages.
//! A tangle — identified by its root message's hash — may be held
//! partially, divergently, or not at all. One sync round per
//! (connection, tangle) determines what each side is missing, transfers
//! exactly that, and enforces the local retention goal afterwards.
//!
//! ## Key Properties
//!
//! - **Pairwise**: one round reconciles two peers; multi-peer convergence
//!   emerges from repeated rounds
//! - **Goal-filtered**: neither side requests, accepts, or is offered
//!   messages outside the applicable retention window
//! - **Order-tolerant**: messages need not arrive causally; a peer may
//!   ingest descendants before it ever sees the root
//! - **Idempotent**: a round over converged peers transfers nothing
//!
//! ## Message Flow
//!
//! ```text
//! Peer A                                Peer B
//!   |-------- Frontier + goal ----------->|
//!   |<------- Frontier + goal ------------|
//!   |-------- Data ... ------------------>|
//!   |<------- Data ... -------------------|
//!   |-------- Done ---------------------->|
//!   |<------- Done -----------------------|
//! ```
//!
//! Frames for concurrent tangle sessions are multiplexed over one
//! connection by tagging each with its tangle root.

pub mod coordinator;
pub mod error;
pub mod prune;
pub mod reconcile;
pub mod registry;
pub mod session;
pub mod transport;
pub mod view;
pub mod wire;

pub use coordinator::Coordinator;
pub use error::{Result, SyncError};
pub use prune::{prune, PruneReport};
pub use reconcile::{reconcile, ReconcilePlan};
pub use registry::GoalRegistry;
pub use session::{SessionReport, SessionState, SyncConfig, SyncSession};
pub use transport::{memory::MemoryConnection, Connection, PeerId};
pub use view::{TangleRecord, TangleView};
pub use wire::{limits, Frame, FrontierEntry, Packet};
