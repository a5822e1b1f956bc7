//! Producer and consumer configuration
//!
//! Plain owned option structs with builder-style setters. Defaults follow
//! the deployed configuration: a sync frame every eleventh view, hourly
//! liveness records, 32 KiB outbound packing, a patient wait for the first
//! metadata record and a short one inside frames.

use std::time::Duration;

/// Longest identity string accepted on the wire.
pub const IDENTITY_MAX_LEN: usize = 255;

/// Default number of diff frames between sync frames.
pub const DEFAULT_MAX_DIFFS: u32 = 10;

/// Default wall-clock interval between members-topic liveness records.
pub const DEFAULT_MEMBERS_INTERVAL: Duration = Duration::from_secs(3600);

/// Default capacity of the outbound packing buffer.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 32 * 1024;

/// Default wait for a metadata record.
pub const DEFAULT_META_TIMEOUT: Duration = Duration::from_secs(2000);

/// Default wait for the next record inside a frame.
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration of one producer instance.
#[derive(Debug, Clone)]
pub struct ProducerOptions {
    /// Identity string distinguishing this producer on shared topics.
    pub identity: String,
    /// Number of diff frames to emit before the next sync frame.
    pub max_diffs: u32,
    /// Wall-clock interval between members-topic liveness records.
    pub members_interval: Duration,
    /// Capacity of the outbound packing buffer; rows are never split
    /// across messages, so a single oversized row still goes out whole.
    pub message_capacity: usize,
}

impl ProducerOptions {
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            max_diffs: DEFAULT_MAX_DIFFS,
            members_interval: DEFAULT_MEMBERS_INTERVAL,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_max_diffs(mut self, max_diffs: u32) -> Self {
        self.max_diffs = max_diffs;
        self
    }

    #[must_use]
    pub fn with_members_interval(mut self, interval: Duration) -> Self {
        self.members_interval = interval;
        self
    }

    #[must_use]
    pub fn with_message_capacity(mut self, capacity: usize) -> Self {
        self.message_capacity = capacity;
        self
    }
}

/// Configuration of one consumer instance.
#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Identity of the producer to follow; records from other producers on
    /// the shared topics are skipped.
    pub identity: String,
    /// How long to wait for a metadata record.
    pub meta_timeout: Duration,
    /// How long to wait for each record inside a frame. Missing this
    /// timeout abandons the frame.
    pub frame_timeout: Duration,
}

impl ConsumerOptions {
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            meta_timeout: DEFAULT_META_TIMEOUT,
            frame_timeout: DEFAULT_FRAME_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_meta_timeout(mut self, timeout: Duration) -> Self {
        self.meta_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_frame_timeout(mut self, timeout: Duration) -> Self {
        self.frame_timeout = timeout;
        self
    }
}
