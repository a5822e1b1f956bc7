//! Send statistics
//!
//! Counters describing the last send. They are reset at the start of every
//! send and exposed read-only afterwards; the diff counters are only
//! meaningful for diff frames, `sync_pfx_cnt` only for sync frames.

/// Counters for one send operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SendStats {
    /// Rows sent in this frame (a prefix emitting both an update and a
    /// remove row counts twice).
    pub pfx_cnt: u32,
    /// Prefixes present only in the current view.
    pub added_pfxs_cnt: u32,
    /// Prefixes present only in the parent view.
    pub removed_pfxs_cnt: u32,
    /// Common prefixes that emitted at least one cell change.
    pub changed_pfxs_cnt: u32,
    /// Prefixes present in both views.
    pub common_pfxs_cnt: u32,
    /// Cells added with respect to the parent view.
    pub added_pfx_peer_cnt: u32,
    /// Cells whose path changed with respect to the parent view.
    pub changed_pfx_peer_cnt: u32,
    /// Cells removed with respect to the parent view.
    pub removed_pfx_peer_cnt: u32,
    /// Prefixes sent as part of a sync frame.
    pub sync_pfx_cnt: u32,
}

impl SendStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
