//! In-memory log broker
//!
//! A [`ViewLog`] implementation backed by per-topic vectors in shared
//! memory. Cloning a handle shares the store but gives the clone its own
//! read positions, so a producer and any number of consumers can run
//! against the same broker inside one process. Used by the integration
//! tests and for local experiments; a networked broker implements the same
//! contract elsewhere.

use crate::error::LogError;
use crate::log::{TopicId, ViewLog};
use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Poll interval while a consume waits for a message to appear.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Default)]
struct Store {
    topics: HashMap<TopicId, Vec<Bytes>>,
}

impl Store {
    fn records(&self, topic: TopicId) -> &[Bytes] {
        self.topics.get(&topic).map_or(&[], Vec::as_slice)
    }
}

/// A handle onto an in-memory log broker.
pub struct MemLog {
    store: Arc<Mutex<Store>>,
    pos: HashMap<TopicId, i64>,
}

impl MemLog {
    /// Create a fresh broker with empty partitions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            pos: HashMap::new(),
        }
    }
}

impl Default for MemLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemLog {
    /// A clone shares the store but starts reading from offset zero.
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pos: HashMap::new(),
        }
    }
}

#[async_trait(?Send)]
impl ViewLog for MemLog {
    async fn produce(&mut self, topic: TopicId, payload: Bytes) -> Result<(), LogError> {
        let mut store = self.store.lock();
        let records = store.topics.entry(topic).or_default();
        trace!("[MEMLOG] append {:?} offset {}", topic, records.len());
        records.push(payload);
        Ok(())
    }

    async fn next_offset(&mut self, topic: TopicId) -> Result<i64, LogError> {
        Ok(self.store.lock().records(topic).len() as i64)
    }

    async fn seek(&mut self, topic: TopicId, offset: i64) -> Result<(), LogError> {
        if offset < 0 {
            return Err(LogError::Seek { topic, offset });
        }
        self.pos.insert(topic, offset);
        Ok(())
    }

    async fn consume(&mut self, topic: TopicId, timeout: Duration) -> Result<Bytes, LogError> {
        let deadline = Instant::now() + timeout;
        loop {
            let pos = self.pos.get(&topic).copied().unwrap_or(0);
            {
                let store = self.store.lock();
                if let Some(record) = store.records(topic).get(pos as usize) {
                    let record = record.clone();
                    drop(store);
                    self.pos.insert(topic, pos + 1);
                    return Ok(record);
                }
            }
            if Instant::now() >= deadline {
                return Err(LogError::ConsumeTimeout { topic });
            }
            compio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[compio::test]
    async fn appends_preserve_order() {
        let mut log = MemLog::new();
        for i in 0u8..4 {
            log.produce(TopicId::Pfxs, Bytes::from(vec![i]))
                .await
                .unwrap();
        }
        assert_eq!(log.next_offset(TopicId::Pfxs).await.unwrap(), 4);

        let mut reader = log.clone();
        for i in 0u8..4 {
            let rec = reader
                .consume(TopicId::Pfxs, Duration::from_millis(10))
                .await
                .unwrap();
            assert_eq!(rec.as_ref(), &[i]);
        }
    }

    #[compio::test]
    async fn seek_repositions_one_handle_only() {
        let mut log = MemLog::new();
        log.produce(TopicId::Meta, Bytes::from_static(b"a"))
            .await
            .unwrap();
        log.produce(TopicId::Meta, Bytes::from_static(b"b"))
            .await
            .unwrap();

        let mut r1 = log.clone();
        let mut r2 = log.clone();
        r1.consume(TopicId::Meta, Duration::from_millis(10))
            .await
            .unwrap();
        r1.seek(TopicId::Meta, 0).await.unwrap();
        let again = r1
            .consume(TopicId::Meta, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(again.as_ref(), b"a");

        let first = r2
            .consume(TopicId::Meta, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(first.as_ref(), b"a");
    }

    #[compio::test]
    async fn consume_times_out_on_empty_partition() {
        let mut log = MemLog::new();
        let err = log
            .consume(TopicId::Peers, Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[compio::test]
    async fn negative_seek_is_rejected() {
        let mut log = MemLog::new();
        assert!(log.seek(TopicId::Meta, -1).await.is_err());
    }
}
