//! Partitioned append-only log contract
//!
//! The replication protocol assumes an ordered, at-least-once log broker
//! with independently addressable partitions. This module defines the
//! narrow contract the protocol needs: append, next-offset query, seek and
//! timed consume. Queue buffering, delivery retries and connection
//! bootstrap are the broker implementation's concern.

use crate::error::LogError;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// The logical streams of one producer channel.
///
/// How a `TopicId` maps to broker topic names and partitions is decided by
/// the [`ViewLog`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicId {
    /// One record per emitted frame: type, time, back-pointers, offsets.
    Meta,
    /// Peer records plus an end marker per frame.
    Peers,
    /// Prefix rows plus an end marker per frame.
    Pfxs,
    /// Out-of-band producer liveness records.
    Members,
}

/// An ordered, partitioned, append-only log.
///
/// Each handle owns its own read positions; consuming advances the
/// position of the handle, not of the underlying store. All operations on
/// one handle are sequential — there is no internal locking requirement.
#[async_trait(?Send)]
pub trait ViewLog {
    /// Append one message to a partition.
    async fn produce(&mut self, topic: TopicId, payload: Bytes) -> Result<(), LogError>;

    /// The offset the next appended message will be assigned.
    async fn next_offset(&mut self, topic: TopicId) -> Result<i64, LogError>;

    /// Position this handle's reader at `offset`.
    async fn seek(&mut self, topic: TopicId, offset: i64) -> Result<(), LogError>;

    /// Read the message at the current position, waiting up to `timeout`
    /// for it to appear, then advance the position.
    async fn consume(&mut self, topic: TopicId, timeout: Duration) -> Result<Bytes, LogError>;
}
