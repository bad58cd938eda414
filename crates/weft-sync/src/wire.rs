//! Wire frames for the tangle sync protocol.
//!
//! A session speaks three logical frames: a frontier announce, data frames
//! carrying whole messages, and an empty done sentinel. Frames are wrapped
//! in a [`Packet`] tagged with the tangle root so that concurrent sessions
//! can share one connection.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use weft_core::{Goal, MsgId};

use crate::error::SyncError;

/// Wire size limits.
pub mod limits {
    /// Max entries in a frontier announce.
    pub const MAX_FRONTIER_ENTRIES: usize = 65_536;
    /// Max payload bytes in a single data frame.
    pub const MAX_DATA_BYTES: usize = 1 << 20;
    /// Max encoded packet size.
    pub const MAX_PACKET_BYTES: usize = 4 << 20;
}

/// One frontier entry: a held message hash with its ordering metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    /// The message id.
    pub id: MsgId,
    /// The message's carried causal depth.
    pub depth: u64,
}

/// Sync protocol frames, per tangle session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Frame {
    /// State advertisement: everything this side holds for the tangle,
    /// plus its registered goal (`None` = no interest; the peer's pull
    /// still proceeds against our frontier).
    Frontier {
        /// This side's registered goal for the tangle.
        goal: Option<Goal>,
        /// Held message hashes with depths.
        entries: Vec<FrontierEntry>,
    },

    /// One whole message: its id and canonical bytes. Messages transfer
    /// whole or not at all.
    Data {
        /// The claimed content address.
        id: MsgId,
        /// Canonical message bytes.
        bytes: Bytes,
    },

    /// Empty sentinel: this side has nothing more to send.
    Done,
}

impl Frame {
    /// Check if this frame respects size limits.
    pub fn validate_limits(&self) -> Result<(), SyncError> {
        match self {
            Frame::Frontier { entries, .. } => {
                if entries.len() > limits::MAX_FRONTIER_ENTRIES {
                    return Err(SyncError::Protocol("too many frontier entries".into()));
                }
            }
            Frame::Data { bytes, .. } => {
                if bytes.len() > limits::MAX_DATA_BYTES {
                    return Err(SyncError::FrameTooLarge {
                        len: bytes.len(),
                        max: limits::MAX_DATA_BYTES,
                    });
                }
            }
            Frame::Done => {}
        }
        Ok(())
    }

    /// Short tag for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Frame::Frontier { .. } => "frontier",
            Frame::Data { .. } => "data",
            Frame::Done => "done",
        }
    }
}

/// Wire envelope: a frame addressed to one tangle session on a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Packet {
    /// The tangle root this frame belongs to.
    pub root: MsgId,
    /// The frame itself.
    pub frame: Frame,
}

impl Packet {
    /// Create a packet.
    pub fn new(root: MsgId, frame: Frame) -> Self {
        Self { root, frame }
    }

    /// Encode to wire bytes (CBOR).
    pub fn encode(&self) -> Result<Bytes, SyncError> {
        self.frame.validate_limits()?;

        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| SyncError::Protocol(format!("encode failed: {}", e)))?;

        if buf.len() > limits::MAX_PACKET_BYTES {
            return Err(SyncError::FrameTooLarge {
                len: buf.len(),
                max: limits::MAX_PACKET_BYTES,
            });
        }
        Ok(buf.into())
    }

    /// Decode from wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        if bytes.len() > limits::MAX_PACKET_BYTES {
            return Err(SyncError::FrameTooLarge {
                len: bytes.len(),
                max: limits::MAX_PACKET_BYTES,
            });
        }

        let packet: Packet = ciborium::from_reader(bytes)
            .map_err(|e| SyncError::Protocol(format!("malformed frame: {}", e)))?;
        packet.frame.validate_limits()?;
        Ok(packet)
    }
}
