//! Viewcast Core
//!
//! This crate contains the runtime-agnostic core building blocks:
//! - Prefix, peer and path-id types (`pfx`, `peer`)
//! - View iteration/mutation contracts (`view`)
//! - Send-side filter callbacks (`filter`)
//! - Partitioned append-only log contract (`log`)
//! - In-memory log broker (`memlog`)
//! - Reference in-memory view (`memview`)
//! - Configuration (`options`)
//! - Error types (`error`)

#![deny(unsafe_code)]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_same_arms)]

pub mod error;
pub mod filter;
pub mod log;
pub mod memlog;
pub mod memview;
pub mod options;
pub mod peer;
pub mod pfx;
pub mod view;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::error::LogError;
    pub use crate::filter::{FilterScope, Verdict, ViewFilter};
    pub use crate::log::{TopicId, ViewLog};
    pub use crate::memlog::MemLog;
    pub use crate::memview::MemView;
    pub use crate::options::{ConsumerOptions, ProducerOptions};
    pub use crate::peer::{Cell, PathId, PeerId, PeerSignature};
    pub use crate::pfx::Prefix;
    pub use crate::view::{ViewBuilder, ViewSource};
}
