//! Reference in-memory view
//!
//! A straightforward implementation of the view contracts over `BTreeMap`s,
//! with the active/inactive bookkeeping the replication protocol expects:
//! deactivated entities stay in memory but disappear from iteration. The
//! production view behind a real deployment lives elsewhere; this one backs
//! the integration tests and small tools.
//!
//! Local peer ids are dense and start at 1; id 0 stays reserved.

use crate::peer::{Cell, PathId, PeerId, PeerSignature};
use crate::pfx::Prefix;
use crate::view::{CellIter, PeerIter, PfxIter, ViewBuilder, ViewSource};
use hashbrown::HashMap;
use std::collections::{BTreeMap, BTreeSet};

struct PeerSlot {
    sig: PeerSignature,
    active: bool,
}

struct CellSlot {
    path: PathId,
    active: bool,
}

#[derive(Default)]
struct PfxEntry {
    active: bool,
    cells: BTreeMap<PeerId, CellSlot>,
}

/// An owned, in-memory snapshot of routing observations.
#[derive(Default)]
pub struct MemView {
    time: u32,
    peers: Vec<PeerSlot>,
    by_sig: HashMap<PeerSignature, PeerId>,
    pfxs: BTreeMap<Prefix, PfxEntry>,
}

impl MemView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total peers ever added, active or not.
    #[must_use]
    pub fn peer_table_len(&self) -> usize {
        self.peers.len()
    }

    /// Number of currently active peers.
    #[must_use]
    pub fn active_peer_cnt(&self) -> usize {
        self.peers.iter().filter(|p| p.active).count()
    }

    /// Number of currently active prefixes.
    #[must_use]
    pub fn active_pfx_cnt(&self) -> usize {
        self.pfxs.values().filter(|e| e.active).count()
    }

    fn slot(&self, peer: PeerId) -> Option<&PeerSlot> {
        let idx = (peer.0 as usize).checked_sub(1)?;
        self.peers.get(idx)
    }

    /// Snapshot the active contents in a form comparable across views with
    /// different local peer-id assignments.
    #[must_use]
    pub fn export(&self) -> ViewExport {
        let peers = self
            .peers
            .iter()
            .filter(|p| p.active)
            .map(|p| p.sig.clone())
            .collect();
        let mut cells = BTreeMap::new();
        for (pfx, entry) in self.pfxs.iter().filter(|(_, e)| e.active) {
            for (peer, cell) in entry.cells.iter().filter(|(_, c)| c.active) {
                if let Some(slot) = self.slot(*peer) {
                    cells.insert((*pfx, slot.sig.clone()), cell.path);
                }
            }
        }
        ViewExport {
            time: self.time,
            peers,
            cells,
        }
    }
}

/// The active contents of a view, keyed by peer signature so that exports
/// from a producer and a consumer compare equal cell-wise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewExport {
    pub time: u32,
    pub peers: BTreeSet<PeerSignature>,
    pub cells: BTreeMap<(Prefix, PeerSignature), PathId>,
}

impl ViewSource for MemView {
    fn time(&self) -> u32 {
        self.time
    }

    fn peers(&self) -> PeerIter<'_> {
        Box::new(
            self.peers
                .iter()
                .enumerate()
                .filter(|(_, p)| p.active)
                .map(|(i, p)| (PeerId(i as u16 + 1), &p.sig)),
        )
    }

    fn prefixes(&self) -> PfxIter<'_> {
        Box::new(
            self.pfxs
                .iter()
                .filter(|(_, e)| e.active)
                .map(|(pfx, _)| *pfx),
        )
    }

    fn cells(&self, pfx: &Prefix) -> CellIter<'_> {
        match self.pfxs.get(pfx).filter(|e| e.active) {
            Some(entry) => Box::new(
                entry
                    .cells
                    .iter()
                    .filter(|(_, c)| c.active)
                    .map(|(peer, c)| Cell::new(*peer, c.path)),
            ),
            None => Box::new(std::iter::empty()),
        }
    }

    fn has_pfx(&self, pfx: &Prefix) -> bool {
        self.pfxs.get(pfx).is_some_and(|e| e.active)
    }

    fn cell(&self, pfx: &Prefix, peer: PeerId) -> Option<PathId> {
        self.pfxs
            .get(pfx)
            .filter(|e| e.active)
            .and_then(|e| e.cells.get(&peer))
            .filter(|c| c.active)
            .map(|c| c.path)
    }

    fn peer_sig(&self, peer: PeerId) -> Option<&PeerSignature> {
        self.slot(peer).filter(|p| p.active).map(|p| &p.sig)
    }

    fn peer_active_pfx_cnt(&self, peer: PeerId) -> usize {
        self.pfxs
            .values()
            .filter(|e| e.active)
            .filter(|e| e.cells.get(&peer).is_some_and(|c| c.active))
            .count()
    }
}

impl ViewBuilder for MemView {
    fn add_peer(&mut self, sig: &PeerSignature) -> Option<PeerId> {
        if let Some(&id) = self.by_sig.get(sig) {
            let idx = id.0 as usize - 1;
            self.peers[idx].active = true;
            return Some(id);
        }
        // id 0 is reserved, so at most u16::MAX peers fit
        if self.peers.len() >= u16::MAX as usize {
            return None;
        }
        self.peers.push(PeerSlot {
            sig: sig.clone(),
            active: true,
        });
        let id = PeerId(self.peers.len() as u16);
        self.by_sig.insert(sig.clone(), id);
        Some(id)
    }

    fn deactivate_peer(&mut self, peer: PeerId) {
        if let Some(idx) = (peer.0 as usize).checked_sub(1) {
            if let Some(slot) = self.peers.get_mut(idx) {
                slot.active = false;
            }
        }
    }

    fn set_cell(&mut self, pfx: &Prefix, peer: PeerId, path: PathId) {
        let entry = self.pfxs.entry(*pfx).or_default();
        entry.active = true;
        entry.cells.insert(peer, CellSlot { path, active: true });
    }

    fn remove_cell(&mut self, pfx: &Prefix, peer: PeerId) {
        if let Some(entry) = self.pfxs.get_mut(pfx) {
            if let Some(cell) = entry.cells.get_mut(&peer) {
                cell.active = false;
            }
        }
    }

    fn remove_pfx(&mut self, pfx: &Prefix) {
        if let Some(entry) = self.pfxs.get_mut(pfx) {
            entry.active = false;
        }
    }

    fn set_time(&mut self, time: u32) {
        self.time = time;
    }

    fn clear(&mut self) {
        self.time = 0;
        self.peers.clear();
        self.by_sig.clear();
        self.pfxs.clear();
    }
}
