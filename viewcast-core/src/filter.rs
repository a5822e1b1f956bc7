//! Send-side filter callbacks
//!
//! Producers may restrict what a send transmits. A single callback is
//! consulted at three granularities: once per peer, once per prefix, and
//! once per prefix-peer cell. Returning [`Verdict::Abort`] cancels the whole
//! send.

use crate::peer::PeerId;
use crate::peer::PeerSignature;
use crate::pfx::Prefix;

/// The entity a filter is being asked about.
#[derive(Debug, Clone, Copy)]
pub enum FilterScope<'a> {
    /// A peer, identified by its signature.
    Peer(&'a PeerSignature),
    /// A prefix.
    Pfx(&'a Prefix),
    /// One prefix-peer cell.
    PfxPeer(&'a Prefix, PeerId),
}

/// A filter's answer for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Transmit this entity.
    Include,
    /// Silently omit this entity.
    Skip,
    /// Cancel the send.
    Abort,
}

/// A send-side filter.
///
/// Filters must be deterministic across sends: the differ re-evaluates the
/// filter against the parent view to decide what the consumer already has,
/// so a filter that answers differently for the same entity will produce
/// spurious rows.
pub trait ViewFilter {
    fn check(&mut self, scope: FilterScope<'_>) -> Verdict;
}

impl<F> ViewFilter for F
where
    F: FnMut(FilterScope<'_>) -> Verdict,
{
    fn check(&mut self, scope: FilterScope<'_>) -> Verdict {
        self(scope)
    }
}
