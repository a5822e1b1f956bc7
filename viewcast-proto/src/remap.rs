//! Producer-local to consumer-local peer id translation
//!
//! Cells on the wire carry the producer's peer ids. Each consumer session
//! keeps a dense table indexed by remote id that translates them to its own
//! view's ids. Local id 0 is the reserved "unmapped" sentinel; the table is
//! zeroed whenever a sync frame starts a fresh session epoch.

use viewcast_core::peer::PeerId;

/// Dense remote-to-local peer id table.
#[derive(Debug, Default)]
pub struct PeerIdMap {
    map: Vec<PeerId>,
}

impl PeerIdMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The local id mapped for `remote`, if any.
    #[must_use]
    pub fn get(&self, remote: PeerId) -> Option<PeerId> {
        self.map
            .get(remote.0 as usize)
            .copied()
            .filter(|local| !local.is_unmapped())
    }

    /// Map `remote` to `local`, growing the table as needed.
    pub fn set(&mut self, remote: PeerId, local: PeerId) {
        let idx = remote.0 as usize;
        if idx >= self.map.len() {
            self.map.resize(idx + 1, PeerId::UNMAPPED);
        }
        self.map[idx] = local;
    }

    /// Forget all mappings, keeping the allocation.
    pub fn clear(&mut self) {
        self.map.fill(PeerId::UNMAPPED);
    }

    /// Number of slots allocated (not the number of mappings).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_ids_resolve_to_none() {
        let map = PeerIdMap::new();
        assert_eq!(map.get(PeerId(5)), None);
        assert_eq!(map.get(PeerId(0)), None);
    }

    #[test]
    fn set_grows_and_resolves() {
        let mut map = PeerIdMap::new();
        map.set(PeerId(40), PeerId(2));
        assert_eq!(map.capacity(), 41);
        assert_eq!(map.get(PeerId(40)), Some(PeerId(2)));
        assert_eq!(map.get(PeerId(39)), None);
    }

    #[test]
    fn clear_keeps_capacity_but_drops_mappings() {
        let mut map = PeerIdMap::new();
        map.set(PeerId(3), PeerId(1));
        map.clear();
        assert_eq!(map.get(PeerId(3)), None);
        assert_eq!(map.capacity(), 4);
    }

    #[test]
    fn remapping_overwrites() {
        let mut map = PeerIdMap::new();
        map.set(PeerId(3), PeerId(1));
        map.set(PeerId(3), PeerId(7));
        assert_eq!(map.get(PeerId(3)), Some(PeerId(7)));
    }
}
