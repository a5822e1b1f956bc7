//! Shared helpers for the protocol integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use viewcast_core::memview::MemView;
use viewcast_core::options::{ConsumerOptions, ProducerOptions};
use viewcast_core::peer::{PathId, PeerSignature};
use viewcast_core::pfx::Prefix;
use viewcast_core::view::ViewBuilder;

pub const IDENTITY: &str = "it-producer";

/// Enable producer/consumer logs when `RUST_LOG` is set.
pub fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// Deterministic peer signature for test index `n`.
pub fn sig(n: u8) -> PeerSignature {
    PeerSignature::new(
        "rrc00",
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, n)),
        64_500 + u32::from(n),
    )
}

/// Build a view at `time` from `(prefix, peer index, path)` triples.
pub fn view_with(time: u32, cells: &[(Prefix, u8, u64)]) -> MemView {
    let mut view = MemView::new();
    view.set_time(time);
    for (pfx, peer, path) in cells {
        let id = view.add_peer(&sig(*peer)).unwrap();
        view.set_cell(pfx, id, PathId::from(*path));
    }
    view
}

pub fn producer_opts() -> ProducerOptions {
    ProducerOptions::new(IDENTITY)
}

/// Consumer options with timeouts short enough for tests.
pub fn consumer_opts() -> ConsumerOptions {
    ConsumerOptions::new(IDENTITY)
        .with_meta_timeout(Duration::from_millis(250))
        .with_frame_timeout(Duration::from_millis(50))
}
