//! Producer publisher
//!
//! Frames a view onto the three streams: peer records then an end marker on
//! `peers`, prefix rows then an end marker on `pfxs`, and finally one
//! metadata record on `meta`. The metadata append is the serialization
//! point — a consumer can only be directed at a frame whose streams are
//! already fully appended, which is why an interrupted send never corrupts
//! the protocol. Durable producer state (`last_sync_offset`, the diff
//! counter) is committed only after the metadata append succeeds.

use crate::cadence::SyncCadence;
use crate::codec::put_signature;
use crate::differ::{self, RowSink, SendFilter};
use crate::error::Result;
use crate::record::{FrameKind, MembersRecord, Metadata, PeersEnd, PfxsEnd, TAG_PEER};
use crate::stats::SendStats;
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use viewcast_core::filter::{FilterScope, ViewFilter};
use viewcast_core::log::{TopicId, ViewLog};
use viewcast_core::options::ProducerOptions;
use viewcast_core::view::ViewSource;

/// Delay between retries of a failed next-offset query.
const OFFSET_RETRY_DELAY: Duration = Duration::from_millis(500);

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Packs records into broker messages of bounded size.
///
/// Records are never split: when the next record would overflow the buffer
/// the current contents go out as one message first. A record larger than
/// the capacity still travels whole, alone in its message.
struct FrameWriter<'a, L: ViewLog> {
    log: &'a mut L,
    topic: TopicId,
    buf: BytesMut,
    capacity: usize,
}

impl<'a, L: ViewLog> FrameWriter<'a, L> {
    fn new(log: &'a mut L, topic: TopicId, capacity: usize) -> Self {
        Self {
            log,
            topic,
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    async fn push(&mut self, record: &[u8]) -> Result<()> {
        if !self.buf.is_empty() && self.buf.len() + record.len() > self.capacity {
            self.flush().await?;
        }
        self.buf.extend_from_slice(record);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let payload = self.buf.split().freeze();
        self.log.produce(self.topic, payload).await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl<L: ViewLog> RowSink for FrameWriter<'_, L> {
    async fn row(&mut self, row: &[u8]) -> Result<()> {
        self.push(row).await
    }
}

/// Publishes snapshots of a view as sync and diff frames.
pub struct Producer<L: ViewLog> {
    log: L,
    opts: ProducerOptions,
    cadence: SyncCadence,
    stats: SendStats,
    /// `meta` offset of the last sync frame's metadata record, or -1 before
    /// the first sync has been published.
    last_sync_offset: i64,
    /// Wall-clock second at which the next members record is due.
    next_members_update: u64,
}

impl<L: ViewLog> Producer<L> {
    #[must_use]
    pub fn new(log: L, opts: ProducerOptions) -> Self {
        let cadence = SyncCadence::new(opts.max_diffs);
        Self {
            log,
            opts,
            cadence,
            stats: SendStats::default(),
            last_sync_offset: -1,
            next_members_update: 0,
        }
    }

    /// Statistics of the last completed send.
    #[must_use]
    pub fn stats(&self) -> &SendStats {
        &self.stats
    }

    /// `meta` offset of the last published sync frame, -1 if none yet.
    #[must_use]
    pub fn last_sync_offset(&self) -> i64 {
        self.last_sync_offset
    }

    /// Diff frames published since the last sync frame.
    #[must_use]
    pub fn diffs_since_sync(&self) -> u32 {
        self.cadence.diffs_since_sync()
    }

    /// Queue the given view for transmission.
    ///
    /// Emits a sync frame when `parent` is absent or the cadence demands
    /// one, otherwise a diff of `view` against `parent`. Only `active`
    /// entities are transmitted. On error the producer's durable state is
    /// untouched, so a retry re-sends the same frame.
    pub async fn send_view<V: ViewSource>(
        &mut self,
        view: &V,
        parent: Option<&V>,
        filter: Option<&mut dyn ViewFilter>,
    ) -> Result<&SendStats> {
        self.stats.reset();
        self.members_heartbeat().await?;

        let mut filter = SendFilter::new(filter);
        let sync = self.cadence.needs_sync(parent.is_some());
        let time = view.time();

        let peers_offset = self.next_offset_retry(TopicId::Peers).await;
        self.send_peers(view, time, &mut filter).await?;

        let pfxs_offset = self.next_offset_retry(TopicId::Pfxs).await;
        self.send_pfxs(view, parent, time, sync, &mut filter).await?;

        // for a sync frame, remember where our own metadata record will land
        let (kind, pending_sync_offset) = if sync {
            let offset = self.next_offset_retry(TopicId::Meta).await;
            (FrameKind::Sync, Some(offset))
        } else {
            let parent_time = parent.map_or(time, ViewSource::time);
            (
                FrameKind::Diff {
                    sync_md_offset: self.last_sync_offset,
                    parent_time,
                },
                None,
            )
        };

        let meta = Metadata {
            identity: self.opts.identity.clone(),
            time,
            pfxs_offset,
            peers_offset,
            kind,
        };
        let mut buf = BytesMut::new();
        meta.encode(&mut buf)?;
        self.log.produce(TopicId::Meta, buf.freeze()).await?;

        // the frame is fully published: commit durable state
        match pending_sync_offset {
            Some(offset) => {
                self.last_sync_offset = offset;
                self.cadence.record_sync();
                debug!(
                    "[PRODUCER] sync frame for view {time} published, meta offset {offset}"
                );
            }
            None => {
                self.cadence.record_diff();
                debug!(
                    "[PRODUCER] diff frame for view {time} published ({} since sync)",
                    self.cadence.diffs_since_sync()
                );
            }
        }

        Ok(&self.stats)
    }

    /// Announce this producer on the members topic when the interval is due.
    async fn members_heartbeat(&mut self) -> Result<()> {
        let now = unix_now();
        if now < self.next_members_update {
            return Ok(());
        }
        debug!("[PRODUCER] updating members topic at {now}");
        let mut buf = BytesMut::new();
        MembersRecord {
            identity: self.opts.identity.clone(),
            time: now as u32,
        }
        .encode(&mut buf)?;
        self.log.produce(TopicId::Members, buf.freeze()).await?;
        self.next_members_update = now + self.opts.members_interval.as_secs();
        Ok(())
    }

    /// Query the next append offset, retrying until the broker answers.
    ///
    /// Offsets are the one value that cannot be recovered after the frame
    /// has gone out, so transient failures here are retried forever.
    async fn next_offset_retry(&mut self, topic: TopicId) -> i64 {
        loop {
            match self.log.next_offset(topic).await {
                Ok(offset) => return offset,
                Err(err) => {
                    warn!("[PRODUCER] offset query on {topic:?} failed: {err}; retrying");
                    compio::time::sleep(OFFSET_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn send_peers<V: ViewSource>(
        &mut self,
        view: &V,
        time: u32,
        filter: &mut SendFilter<'_>,
    ) -> Result<()> {
        let mut writer = FrameWriter::new(&mut self.log, TopicId::Peers, self.opts.message_capacity);
        let mut scratch = BytesMut::new();
        let mut peers_tx: u16 = 0;

        for (id, sig) in view.peers() {
            if !filter.check(FilterScope::Peer(sig))? {
                continue;
            }
            scratch.clear();
            scratch.put_u8(TAG_PEER);
            scratch.put_u16(id.0);
            put_signature(&mut scratch, sig)?;
            writer.push(&scratch).await?;
            peers_tx += 1;
        }

        scratch.clear();
        PeersEnd {
            time,
            peer_cnt: peers_tx,
        }
        .encode(&mut scratch);
        writer.push(&scratch).await?;
        writer.flush().await
    }

    async fn send_pfxs<V: ViewSource>(
        &mut self,
        view: &V,
        parent: Option<&V>,
        time: u32,
        sync: bool,
        filter: &mut SendFilter<'_>,
    ) -> Result<()> {
        let mut writer = FrameWriter::new(&mut self.log, TopicId::Pfxs, self.opts.message_capacity);
        let mut scratch = BytesMut::new();

        match (sync, parent) {
            (false, Some(parent)) => {
                differ::emit_diff(view, parent, filter, &mut writer, &mut self.stats, &mut scratch)
                    .await?;
            }
            _ => {
                differ::emit_sync(view, filter, &mut writer, &mut self.stats, &mut scratch)
                    .await?;
            }
        }

        scratch.clear();
        PfxsEnd {
            time,
            row_cnt: self.stats.pfx_cnt,
        }
        .encode(&mut scratch);
        writer.push(&scratch).await?;
        writer.flush().await
    }
}
