//! # Viewcast Proto
//!
//! **Internal protocol implementation crate for Viewcast.**
//!
//! Transports successive snapshots of a BGP routing-table view between one
//! producer and any number of consumers through a partitioned, append-only
//! log. Each snapshot travels as either a self-contained *sync* frame or a
//! *diff* frame against the previously emitted view, spread across three
//! coordinated streams:
//!
//! - `meta` — one record per frame: type, time, stream offsets, and for
//!   diffs a back-pointer to the last sync frame.
//! - `peers` — the active peer set, closed by an end marker.
//! - `pfxs` — prefix rows (`'S'` sync / `'U'` update / `'R'` remove),
//!   closed by an end marker.
//!
//! Consumers rebuild each view byte-identically and can join mid-stream:
//! a diff whose parent is unknown rewinds to the sync frame it references.
//!
//! For application development use the `viewcast` crate, which re-exports
//! the public surface of this one.

// Allow some pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::future_not_send)] // single-threaded by design

pub mod cadence;
pub mod codec;
pub mod consumer;
pub mod differ;
pub mod error;
pub mod producer;
pub mod record;
pub mod remap;
pub mod stats;

pub use consumer::{Consumer, Delivery};
pub use error::{ProtoError, Result};
pub use producer::Producer;
pub use stats::SendStats;
