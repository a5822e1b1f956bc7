//! Peer identity types
//!
//! A peer is a BGP vantage point identified by its signature: the collector
//! that observed it, its IP address and its AS number. Signatures are
//! content-addressable; identical signatures denote the same peer.

use std::fmt;
use std::net::IpAddr;

/// A 16-bit peer identifier, local to one view instance.
///
/// Producer-local identifiers travel inside cells on the wire; consumers
/// translate them to their own identifiers through a remap table. `0` is
/// reserved as the "unmapped" sentinel and is never a valid identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub u16);

impl PeerId {
    /// The reserved sentinel meaning "no peer".
    pub const UNMAPPED: PeerId = PeerId(0);

    #[must_use]
    pub const fn is_unmapped(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque interned AS-path handle.
///
/// The handle is stable for the lifetime of a producer session; two cells
/// carry the same path exactly when their handles compare equal byte-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(pub [u8; 8]);

impl PathId {
    pub const WIRE_LEN: usize = 8;

    #[must_use]
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl From<u64> for PathId {
    fn from(v: u64) -> Self {
        Self(v.to_be_bytes())
    }
}

/// The content-addressable identity of a peer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerSignature {
    /// Name of the route collector this peer session belongs to (ASCII,
    /// at most 255 bytes on the wire).
    pub collector: String,
    /// Peer IP address.
    pub addr: IpAddr,
    /// Peer AS number.
    pub asn: u32,
}

impl PeerSignature {
    #[must_use]
    pub fn new(collector: impl Into<String>, addr: IpAddr, asn: u32) -> Self {
        Self {
            collector: collector.into(),
            addr,
            asn,
        }
    }
}

impl fmt::Display for PeerSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|AS{}", self.collector, self.addr, self.asn)
    }
}

/// One prefix-peer observation: the observing peer and its AS path handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub peer: PeerId,
    pub path: PathId,
}

impl Cell {
    #[must_use]
    pub const fn new(peer: PeerId, path: PathId) -> Self {
        Self { peer, path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn path_id_roundtrips_u64() {
        let id = PathId::from(0xdead_beef_u64);
        assert_eq!(u64::from_be_bytes(*id.as_bytes()), 0xdead_beef);
    }

    #[test]
    fn signatures_are_content_addressable() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
        let a = PeerSignature::new("rrc00", ip, 65000);
        let b = PeerSignature::new("rrc00", ip, 65000);
        assert_eq!(a, b);
        assert_ne!(a, PeerSignature::new("rrc01", ip, 65000));
    }

    #[test]
    fn unmapped_sentinel() {
        assert!(PeerId::UNMAPPED.is_unmapped());
        assert!(!PeerId(1).is_unmapped());
    }
}
