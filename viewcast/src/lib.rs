//! # Viewcast
//!
//! Differential replication of BGP routing-table views over a partitioned,
//! append-only log.
//!
//! ## Architecture
//!
//! Viewcast is structured in clean layers:
//!
//! - **`viewcast-core`**: view contracts, prefix/peer types, the log broker
//!   abstraction and in-memory reference implementations
//! - **`viewcast-proto`**: the wire codec, snapshot differ, producer and
//!   consumer state machines
//! - **`viewcast`**: public API surface (this crate)
//!
//! ## Quick Start
//!
//! ```rust
//! use viewcast::prelude::*;
//! use viewcast::{Consumer, Producer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let log = MemLog::new();
//!
//! // producer side: fill a view and send it
//! let mut view = MemView::new();
//! view.set_time(1_700_000_000);
//! let peer = view
//!     .add_peer(&PeerSignature::new("rrc00", "192.0.2.1".parse()?, 65000))
//!     .unwrap();
//! view.set_cell(&Prefix::v4(10, 0, 0, 0, 8), peer, PathId::from(42));
//!
//! let mut producer = Producer::new(log.clone(), ProducerOptions::new("demo"));
//! producer.send_view(&view, None, None).await?;
//!
//! // consumer side: rebuild the view
//! let mut rebuilt = MemView::new();
//! let mut consumer = Consumer::new(log.clone(), ConsumerOptions::new("demo"));
//! let delivery = consumer.recv_view(&mut rebuilt).await?;
//! assert!(delivery.sync);
//! assert_eq!(rebuilt.export(), view.export());
//! # Ok(())
//! # }
//! ```
//!
//! Subsequent sends pass the previous view as `parent` and travel as diff
//! frames; the producer interleaves a fresh sync frame every `max_diffs`
//! sends so consumers can always rejoin mid-stream.
//!
//! ## Design
//!
//! - **Zero-copy**: wire buffers use `bytes::Bytes`; decoding borrows from
//!   the broker message
//! - **Sans-IO diffing**: the differ is pure, the publisher owns framing
//!   and broker I/O
//! - **Single-threaded**: every producer/consumer instance owns its state;
//!   run several instances for several feeds

#![warn(missing_docs)]

pub mod dev_tracing;

pub use viewcast_proto::{Consumer, Delivery, Producer, ProtoError, SendStats};

// Re-export dependencies for user convenience
pub use bytes;
pub use compio;
pub use tracing;

/// Commonly used types, re-exported from the internal crates.
pub mod prelude {
    pub use viewcast_core::prelude::*;
}

/// Core contracts and reference implementations.
pub mod core {
    pub use viewcast_core::*;
}

/// Wire-level protocol internals.
pub mod proto {
    pub use viewcast_proto::*;
}
