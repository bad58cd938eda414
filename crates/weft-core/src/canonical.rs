//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! The canonical encoding is critical: it ensures that the same message
//! produces identical bytes (and thus an identical MsgId) across all
//! platforms, which is what lets two peers agree on tangle membership by
//! exchanging hashes alone.

use ciborium::value::Value;

use crate::error::CoreError;
use crate::hash::{AuthorId, Blake3Hash};
use crate::msg::{Msg, MsgHeader};
use crate::types::MsgId;

/// Header field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const VERSION: u64 = 0;
    pub const AUTHOR: u64 = 1;
    pub const KIND: u64 = 2;
    pub const DEPTH: u64 = 3;
    pub const PREV: u64 = 4;
    pub const PAYLOAD_HASH: u64 = 5;
}

/// Encode a message header to canonical CBOR bytes.
pub fn canonical_header_bytes(header: &MsgHeader) -> Vec<u8> {
    let value = header_to_cbor_value(header);
    encode_cbor_value_canonical(&value)
}

/// Encode an entire message to canonical bytes.
///
/// Format: canonical_header || payload
pub fn canonical_bytes(msg: &Msg) -> Vec<u8> {
    let mut buf = canonical_header_bytes(&msg.header);
    buf.extend_from_slice(&msg.payload);
    buf
}

/// Convert a header to a CBOR Value (map with integer keys).
fn header_to_cbor_value(header: &MsgHeader) -> Value {
    // Build map entries in key order (already sorted 0-5)
    let mut entries = Vec::with_capacity(6);

    // 0: version
    entries.push((
        Value::Integer(keys::VERSION.into()),
        Value::Integer(header.version.into()),
    ));

    // 1: author
    entries.push((
        Value::Integer(keys::AUTHOR.into()),
        Value::Bytes(header.author.0.to_vec()),
    ));

    // 2: kind
    entries.push((
        Value::Integer(keys::KIND.into()),
        Value::Text(header.kind.clone()),
    ));

    // 3: depth
    entries.push((
        Value::Integer(keys::DEPTH.into()),
        Value::Integer(header.depth.into()),
    ));

    // 4: prev (array of bytes)
    let prev_array: Vec<Value> = header
        .prev
        .iter()
        .map(|p| Value::Bytes(p.0.to_vec()))
        .collect();
    entries.push((Value::Integer(keys::PREV.into()), Value::Array(prev_array)));

    // 5: payload_hash
    entries.push((
        Value::Integer(keys::PAYLOAD_HASH.into()),
        Value::Bytes(header.payload_hash.0.to_vec()),
    ));

    Value::Map(entries)
}

/// Encode a CBOR Value to canonical bytes.
///
/// This function ensures:
/// - Map keys are sorted by encoded byte comparison
/// - Integers use smallest encoding
/// - Definite lengths only
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            encode_integer(buf, *i);
        }
        Value::Bytes(b) => {
            encode_bytes(buf, b);
        }
        Value::Text(s) => {
            encode_text(buf, s);
        }
        Value::Array(arr) => {
            encode_array(buf, arr);
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        Value::Null => {
            buf.push(0xf6);
        }
        Value::Float(_) => {
            panic!("floats not supported in canonical encoding");
        }
        _ => {
            panic!("unsupported CBOR value type");
        }
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        // Major type 0: unsigned integer
        encode_uint(buf, 0, n as u64);
    } else {
        // Major type 1: negative integer
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    // Encode all keys first to sort by encoded bytes
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    // Sort by encoded key bytes (lexicographic)
    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    // Write map header
    encode_uint(buf, 5, key_value_pairs.len() as u64);

    // Write sorted key-value pairs
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

/// Decode a message from canonical bytes.
pub fn decode_msg(bytes: &[u8]) -> Result<Msg, CoreError> {
    // Parse CBOR header
    let cursor = std::io::Cursor::new(bytes);
    let value: Value =
        ciborium::from_reader(cursor).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let header = cbor_value_to_header(&value)?;

    // Calculate header length by re-encoding
    let header_bytes = canonical_header_bytes(&header);
    let header_len = header_bytes.len();

    if bytes.len() < header_len {
        return Err(CoreError::MalformedMsg("truncated header".into()));
    }
    if bytes[..header_len] != header_bytes[..] {
        return Err(CoreError::MalformedMsg("non-canonical header".into()));
    }

    // Payload is everything after the header
    let payload = bytes[header_len..].to_vec();

    Ok(Msg {
        header,
        payload: payload.into(),
    })
}

/// Convert a CBOR Value (map) back to a MsgHeader.
fn cbor_value_to_header(value: &Value) -> Result<MsgHeader, CoreError> {
    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedMsg("expected map".into())),
    };

    // Helper to get a value by integer key
    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
            .map(|(_, v)| v)
    };

    // Parse version
    let version = match get(keys::VERSION) {
        Some(Value::Integer(i)) => {
            let n: i128 = (*i).into();
            n as u8
        }
        _ => return Err(CoreError::MalformedMsg("missing version".into())),
    };

    // Parse author
    let author = match get(keys::AUTHOR) {
        Some(Value::Bytes(b)) if b.len() == 32 => {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(b);
            AuthorId(arr)
        }
        _ => return Err(CoreError::MalformedMsg("invalid author".into())),
    };

    // Parse kind
    let kind = match get(keys::KIND) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(CoreError::MalformedMsg("invalid kind".into())),
    };

    // Parse depth
    let depth = match get(keys::DEPTH) {
        Some(Value::Integer(i)) => {
            let n: i128 = (*i).into();
            if n < 0 {
                return Err(CoreError::MalformedMsg("negative depth".into()));
            }
            n as u64
        }
        _ => return Err(CoreError::MalformedMsg("missing depth".into())),
    };

    // Parse prev
    let prev = match get(keys::PREV) {
        Some(Value::Array(arr)) => {
            let mut prev = Vec::with_capacity(arr.len());
            for item in arr {
                match item {
                    Value::Bytes(b) if b.len() == 32 => {
                        let mut arr = [0u8; 32];
                        arr.copy_from_slice(b);
                        prev.push(MsgId(arr));
                    }
                    _ => {
                        return Err(CoreError::MalformedMsg("invalid prev link".into()));
                    }
                }
            }
            prev
        }
        None => Vec::new(),
        _ => return Err(CoreError::MalformedMsg("invalid prev".into())),
    };

    // Parse payload_hash
    let payload_hash = match get(keys::PAYLOAD_HASH) {
        Some(Value::Bytes(b)) if b.len() == 32 => {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(b);
            Blake3Hash(arr)
        }
        _ => return Err(CoreError::MalformedMsg("invalid payload_hash".into())),
    };

    Ok(MsgHeader {
        version,
        author,
        kind,
        depth,
        prev,
        payload_hash,
    })
}
