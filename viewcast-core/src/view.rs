//! View iteration and mutation contracts
//!
//! The replication codec never owns the routing-table view; it walks a view
//! through [`ViewSource`] when encoding and rebuilds one through
//! [`ViewBuilder`] when decoding. Both contracts are active-only: inactive
//! peers, prefixes and cells exist in the view's memory but are invisible
//! here, and are therefore never transmitted.

use crate::peer::{Cell, PathId, PeerId, PeerSignature};
use crate::pfx::Prefix;

/// Iterator over the active peers of a view.
pub type PeerIter<'a> = Box<dyn Iterator<Item = (PeerId, &'a PeerSignature)> + 'a>;
/// Iterator over the active prefixes of a view, in deterministic order.
pub type PfxIter<'a> = Box<dyn Iterator<Item = Prefix> + 'a>;
/// Iterator over the active cells of one prefix.
pub type CellIter<'a> = Box<dyn Iterator<Item = Cell> + 'a>;

/// Read access to a snapshot of BGP routing observations.
pub trait ViewSource {
    /// The time this view describes.
    fn time(&self) -> u32;

    /// All active peers with their signatures.
    fn peers(&self) -> PeerIter<'_>;

    /// All active prefixes, in a deterministic traversal order.
    fn prefixes(&self) -> PfxIter<'_>;

    /// Active cells of `pfx`. Empty if the prefix is absent or inactive.
    fn cells(&self, pfx: &Prefix) -> CellIter<'_>;

    /// Whether `pfx` is present and active.
    fn has_pfx(&self, pfx: &Prefix) -> bool;

    /// The path of the active cell `(pfx, peer)`, if any.
    fn cell(&self, pfx: &Prefix, peer: PeerId) -> Option<PathId>;

    /// Signature of an active peer.
    fn peer_sig(&self, peer: PeerId) -> Option<&PeerSignature>;

    /// Number of active prefixes carrying an active cell for `peer`.
    fn peer_active_pfx_cnt(&self, peer: PeerId) -> usize;
}

/// Write access used by the consumer to rebuild a view.
pub trait ViewBuilder {
    /// Add (or re-activate) a peer by signature and return its local id.
    ///
    /// Returns `None` when the peer table cannot grow any further.
    fn add_peer(&mut self, sig: &PeerSignature) -> Option<PeerId>;

    /// Mark a peer inactive.
    fn deactivate_peer(&mut self, peer: PeerId);

    /// Insert or overwrite the cell `(pfx, peer)`, activating the prefix.
    fn set_cell(&mut self, pfx: &Prefix, peer: PeerId, path: PathId);

    /// Mark the cell `(pfx, peer)` inactive.
    fn remove_cell(&mut self, pfx: &Prefix, peer: PeerId);

    /// Mark the whole prefix inactive.
    fn remove_pfx(&mut self, pfx: &Prefix);

    /// Set the view time.
    fn set_time(&mut self, time: u32);

    /// Drop all peers, prefixes and cells.
    fn clear(&mut self);
}
