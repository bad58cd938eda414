//! # Weft Testkit
//!
//! Testing utilities for weft.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: deterministic authors, linear feeds, and thread
//!   builders for setting up sync scenarios
//! - **Generators**: proptest strategies for property-based testing
//! - **Determinism vectors**: fixed inputs whose canonicalization must be
//!   stable and reversible on every build
//!
//! ## Fixtures
//!
//! ```rust
//! use weft_testkit::fixtures::FeedFixture;
//!
//! let feed = FeedFixture::new("carol", 10);
//! assert_eq!(feed.msgs().len(), 11); // root + m1..m10
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use weft_testkit::generators::{msg_from_params, MsgParams};
//!
//! proptest! {
//!     #[test]
//!     fn msg_id_is_deterministic(params: MsgParams) {
//!         let m1 = msg_from_params(&params);
//!         let m2 = msg_from_params(&params);
//!         prop_assert_eq!(m1.compute_id(), m2.compute_id());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{author, post, reaction, reply, seed_all, texts, FeedFixture};
pub use generators::{msg_from_params, MsgParams};
pub use vectors::{all_vectors, msg_from_vector, verify_all_vectors, DeterminismVector};
