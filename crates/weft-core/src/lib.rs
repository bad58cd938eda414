//! # Weft Core
//!
//! Pure primitives for weft: tangle messages, canonical encoding, and
//! retention goals.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`Msg`] - The immutable unit of a tangle
//! - [`MsgId`] - Content-addressed identifier (Blake3 hash); a root
//!   message's id is the identity of its tangle
//! - [`AuthorId`] - Author/group identifier carried on every message
//! - [`Goal`] - Retention policy for one tangle (`all` / `newest-<N>`)
//!
//! ## Canonicalization
//!
//! All messages are encoded using deterministic CBOR. See [`canonical`].

pub mod canonical;
pub mod error;
pub mod goal;
pub mod hash;
pub mod msg;
pub mod types;
pub mod validation;

pub use canonical::{canonical_bytes, canonical_header_bytes, decode_msg};
pub use error::{CoreError, ValidationError};
pub use goal::Goal;
pub use hash::{AuthorId, Blake3Hash};
pub use msg::{Msg, MsgBuilder, MsgHeader, MAX_LINKS, MSG_VERSION};
pub use types::MsgId;
pub use validation::{validate_claimed, validate_msg};
