//! Message validation: structural checks on tangle messages.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::hash::Blake3Hash;
use crate::msg::{Msg, MAX_LINKS, MSG_VERSION};
use crate::types::MsgId;

/// Validate a message's structure.
///
/// This performs:
/// - Version check
/// - Payload hash verification
/// - Structural rules (link count, root/depth consistency)
pub fn validate_msg(msg: &Msg) -> Result<(), ValidationError> {
    // 1. Check version
    if msg.header.version != MSG_VERSION {
        return Err(ValidationError::UnsupportedVersion(msg.header.version));
    }

    // 2. Verify payload hash
    let computed_hash = Blake3Hash::hash(&msg.payload);
    if computed_hash != msg.header.payload_hash {
        return Err(ValidationError::PayloadHashMismatch);
    }

    // 3. Check link count
    if msg.header.prev.len() > MAX_LINKS {
        return Err(ValidationError::TooManyLinks);
    }

    // 4. Root consistency: depth 0 iff no links
    if msg.header.depth == 0 && !msg.header.prev.is_empty() {
        return Err(ValidationError::MalformedRoot);
    }
    if msg.header.depth > 0 && msg.header.prev.is_empty() {
        return Err(ValidationError::MissingLinks(msg.header.depth));
    }

    // 5. Links must be distinct
    let mut seen = HashSet::with_capacity(msg.header.prev.len());
    for link in &msg.header.prev {
        if !seen.insert(link) {
            return Err(ValidationError::DuplicateLink(*link));
        }
    }

    Ok(())
}

/// Validate a message received under a claimed id.
///
/// Performs [`validate_msg`] plus the content-address check: the id
/// recomputed from the message bytes must equal the claimed id.
pub fn validate_claimed(msg: &Msg, claimed: &MsgId) -> Result<(), ValidationError> {
    validate_msg(msg)?;

    let computed = msg.compute_id();
    if computed != *claimed {
        return Err(ValidationError::IdMismatch {
            claimed: *claimed,
            computed,
        });
    }

    Ok(())
}
