//! # Weft Store
//!
//! The message-store interface consumed by the weft sync core.
//!
//! ## Overview
//!
//! Durable storage is an external collaborator: hosts bring their own
//! backend and expose it through the [`MsgStore`] trait. This crate defines
//! that trait plus [`MemoryStore`], the in-memory reference implementation
//! used throughout the test suite.
//!
//! ## Key Types
//!
//! - [`MsgStore`] - The async trait for all storage operations
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`AddResult`] - Result of adding a message
//! - [`TangleEntry`] - Index record yielded by tangle-wide queries
//!
//! ## Design Notes
//!
//! - **Idempotent adds**: Adding the same message twice returns `Duplicate`
//! - **Root-less tolerance**: Descendants may be stored before their causal
//!   chain to the root is held
//! - **Insertion order**: Tangle queries yield messages in the order they
//!   arrived, not causal order

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use traits::{AddResult, MsgStore, TangleEntry};
