//! Error types for the log broker contract.

use crate::log::TopicId;
use thiserror::Error;

/// Failures of the partitioned-log broker.
#[derive(Debug, Error)]
pub enum LogError {
    /// Appending a message failed.
    #[error("produce to {topic:?} failed: {reason}")]
    Produce { topic: TopicId, reason: String },

    /// No message arrived within the consume timeout.
    #[error("consume from {topic:?} timed out")]
    ConsumeTimeout { topic: TopicId },

    /// Consuming failed for a reason other than a timeout.
    #[error("consume from {topic:?} failed: {reason}")]
    Consume { topic: TopicId, reason: String },

    /// Seeking a partition to an offset failed.
    #[error("seek on {topic:?} to offset {offset} failed")]
    Seek { topic: TopicId, offset: i64 },

    /// Querying the next append offset failed.
    #[error("offset query on {topic:?} failed: {reason}")]
    OffsetQuery { topic: TopicId, reason: String },
}

impl LogError {
    /// Whether this error is a consume timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ConsumeTimeout { .. })
    }
}
