//! Determinism vectors.
//!
//! Fixed inputs that every build must canonicalize identically: the
//! encoded bytes and the resulting message id are recomputed twice and
//! round-tripped through the decoder. Pinning expected hex digests is
//! left to release tooling; what matters here is that canonicalization is
//! stable and reversible for representative shapes.

use weft_core::{canonical_bytes, decode_msg, AuthorId, Msg, MsgBuilder, MsgId};

/// A determinism vector.
#[derive(Debug, Clone)]
pub struct DeterminismVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Author label (derived into an AuthorId).
    pub author: &'static str,
    /// Type tag.
    pub kind: &'static str,
    /// Carried depth.
    pub depth: u64,
    /// Predecessor hashes (fixed bytes).
    pub prev: &'static [[u8; 32]],
    /// Payload bytes.
    pub payload: &'static [u8],
}

/// Get all determinism vectors.
pub fn all_vectors() -> Vec<DeterminismVector> {
    vec![
        DeterminismVector {
            name: "root with hello payload",
            author: "alice",
            kind: "post",
            depth: 0,
            prev: &[],
            payload: b"hello",
        },
        DeterminismVector {
            name: "chained post",
            author: "alice",
            kind: "post",
            depth: 1,
            prev: &[[0xAA; 32]],
            payload: b"world",
        },
        DeterminismVector {
            name: "reaction with two links",
            author: "bob",
            kind: "reaction",
            depth: 7,
            prev: &[[0x11; 32], [0x22; 32]],
            payload: b"yes",
        },
        DeterminismVector {
            name: "empty payload root",
            author: "carol",
            kind: "post",
            depth: 0,
            prev: &[],
            payload: b"",
        },
        DeterminismVector {
            name: "large depth",
            author: "carol",
            kind: "post",
            depth: 1_000_000,
            prev: &[[0x42; 32]],
            payload: b"deep",
        },
    ]
}

/// Build the message a vector describes.
pub fn msg_from_vector(vector: &DeterminismVector) -> Msg {
    let mut builder = MsgBuilder::new(AuthorId::derive(vector.author), vector.kind)
        .depth(vector.depth);
    for link in vector.prev {
        builder = builder.link(MsgId::from_bytes(*link));
    }
    builder.payload(vector.payload.to_vec()).build()
}

/// Verify one vector: stable bytes, stable id, clean decode roundtrip.
pub fn verify_vector(vector: &DeterminismVector) -> Result<MsgId, String> {
    let m1 = msg_from_vector(vector);
    let m2 = msg_from_vector(vector);

    let b1 = canonical_bytes(&m1);
    let b2 = canonical_bytes(&m2);
    if b1 != b2 {
        return Err(format!("{}: canonical bytes unstable", vector.name));
    }

    let id1 = m1.compute_id();
    let id2 = m2.compute_id();
    if id1 != id2 {
        return Err(format!("{}: message id unstable", vector.name));
    }

    let decoded = decode_msg(&b1).map_err(|e| format!("{}: decode failed: {}", vector.name, e))?;
    if decoded != m1 {
        return Err(format!("{}: decode roundtrip diverged", vector.name));
    }

    Ok(id1)
}

/// Verify all vectors, returning (name, id hex) per vector.
pub fn verify_all_vectors() -> Result<Vec<(String, String)>, String> {
    all_vectors()
        .iter()
        .map(|v| verify_vector(v).map(|id| (v.name.to_string(), hex::encode(id.0))))
        .collect()
}
