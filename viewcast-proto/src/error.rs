//! Protocol-level error type
//!
//! Wire and broker failures are wrapped; the remaining variants are the
//! protocol's own: filter aborts, frame cross-validation failures and
//! resource exhaustion. Two conditions are deliberately *not* errors:
//! a metadata record from another producer (skipped) and a diff whose
//! parent does not match the working view (rewound).

use crate::codec::WireError;
use thiserror::Error;
use viewcast_core::error::LogError;

/// Failures of a send or receive operation.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Malformed data on the wire.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Broker I/O failure.
    #[error(transparent)]
    Log(#[from] LogError),

    /// The user filter asked for the send to be cancelled.
    #[error("send aborted by filter")]
    FilterAbort,

    /// An end marker disagreed with the frame's metadata.
    #[error("frame validation failed: {0}")]
    FrameMismatch(&'static str),

    /// A cell referenced a remote peer id with no mapping in this session.
    #[error("cell references unmapped remote peer {0}")]
    UnmappedPeer(u16),

    /// The view's peer table cannot hold another peer.
    #[error("peer table is full")]
    PeerTableFull,
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

impl ProtoError {
    /// Whether a frame that failed with this error may be abandoned and
    /// replayed from the last sync frame.
    #[must_use]
    pub const fn is_frame_recoverable(&self) -> bool {
        matches!(self, Self::Log(LogError::ConsumeTimeout { .. }))
    }
}
