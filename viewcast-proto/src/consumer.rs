//! Consumer receiver
//!
//! Rebuilds the producer's snapshots from the three streams. `meta` dictates
//! order: each received metadata record names the frame to read, the peers
//! stream is drained before the prefixes stream, and a diff whose parent is
//! not the current working view triggers a rewind to the sync frame it
//! references. That rewind covers cold starts, skipped frames and data loss
//! alike.
//!
//! ```text
//! WaitingMeta -> ReadingPeers -> ReadingPfxs -> Delivered -> (return)
//!      ^              |               |
//!      +- RewindToSync <- frame timeout on a diff
//! ```

use crate::error::{ProtoError, Result};
use crate::record::{
    decode_peers_record, decode_pfxs_record, FrameKind, Metadata, PeerRecord, PeersStreamRecord,
    PfxRow, PfxsStreamRecord, RowOp,
};
use crate::remap::PeerIdMap;
use bytes::Bytes;
use tracing::{debug, warn};
use viewcast_core::log::{TopicId, ViewLog};
use viewcast_core::options::ConsumerOptions;
use viewcast_core::peer::PeerId;
use viewcast_core::view::{ViewBuilder, ViewSource};

/// What [`Consumer::recv_view`] delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Time of the delivered view.
    pub time: u32,
    /// Whether the frame was a sync frame (the view was rebuilt from
    /// scratch) or a diff applied in place.
    pub sync: bool,
}

enum RecvState {
    WaitingMeta,
    RewindToSync { sync_md_offset: i64 },
    ReadingPeers(Metadata),
    ReadingPfxs(Metadata),
    Delivered(Metadata),
}

/// Reads records of one frame across message boundaries.
///
/// The producer packs multiple records into each broker message; this
/// cursor hands them out one at a time, pulling the next message when the
/// current one is exhausted.
struct FrameCursor {
    msg: Bytes,
    off: usize,
}

impl FrameCursor {
    fn new() -> Self {
        Self {
            msg: Bytes::new(),
            off: 0,
        }
    }

    async fn next_record<L, T>(
        &mut self,
        log: &mut L,
        topic: TopicId,
        timeout: std::time::Duration,
        decode: impl Fn(&mut &[u8]) -> crate::codec::Result<T>,
    ) -> Result<T>
    where
        L: ViewLog,
    {
        if self.off >= self.msg.len() {
            self.msg = log.consume(topic, timeout).await?;
            self.off = 0;
        }
        let mut src = &self.msg[self.off..];
        let before = src.len();
        let record = decode(&mut src)?;
        self.off += before - src.len();
        Ok(record)
    }
}

/// Rebuilds views published by one producer identity.
pub struct Consumer<L: ViewLog> {
    log: L,
    opts: ConsumerOptions,
    remap: PeerIdMap,
    started: bool,
}

impl<L: ViewLog> Consumer<L> {
    #[must_use]
    pub fn new(log: L, opts: ConsumerOptions) -> Self {
        Self {
            log,
            opts,
            remap: PeerIdMap::new(),
            started: false,
        }
    }

    /// Receive the next view into `view`.
    ///
    /// `view` must either be empty (a fresh session rewinds to the last
    /// sync frame on its own) or hold the previously received view so that
    /// diffs can be applied in place. On an intra-frame error the view may
    /// be partially mutated; diff frames recover by rewinding, a failed
    /// sync frame surfaces the error to the caller.
    pub async fn recv_view<V>(&mut self, view: &mut V) -> Result<Delivery>
    where
        V: ViewSource + ViewBuilder,
    {
        if !self.started {
            // start from the most recent metadata record, like a live tail
            let next = self.log.next_offset(TopicId::Meta).await?;
            self.log.seek(TopicId::Meta, (next - 1).max(0)).await?;
            self.started = true;
        }

        let mut state = RecvState::WaitingMeta;
        loop {
            state = match state {
                RecvState::WaitingMeta => self.waiting_meta(view).await?,
                RecvState::RewindToSync { sync_md_offset } => {
                    self.log.seek(TopicId::Meta, sync_md_offset).await?;
                    RecvState::WaitingMeta
                }
                RecvState::ReadingPeers(meta) => match self.read_peers(view, &meta).await {
                    Ok(()) => RecvState::ReadingPfxs(meta),
                    Err(err) => Self::frame_failure(meta, err)?,
                },
                RecvState::ReadingPfxs(meta) => match self.read_pfxs(view, &meta).await {
                    Ok(()) => RecvState::Delivered(meta),
                    Err(err) => Self::frame_failure(meta, err)?,
                },
                RecvState::Delivered(meta) => {
                    // a peer with no active prefix cells left is gone
                    let idle: Vec<PeerId> = view
                        .peers()
                        .filter(|(id, _)| view.peer_active_pfx_cnt(*id) == 0)
                        .map(|(id, _)| id)
                        .collect();
                    for id in idle {
                        view.deactivate_peer(id);
                    }
                    view.set_time(meta.time);
                    debug!(
                        "[CONSUMER] delivered {} frame for view {}",
                        if meta.kind.is_sync() { "sync" } else { "diff" },
                        meta.time
                    );
                    return Ok(Delivery {
                        time: meta.time,
                        sync: meta.kind.is_sync(),
                    });
                }
            };
        }
    }

    /// Consume metadata records until one describes a usable frame.
    async fn waiting_meta<V>(&mut self, view: &mut V) -> Result<RecvState>
    where
        V: ViewSource + ViewBuilder,
    {
        let payload = self
            .log
            .consume(TopicId::Meta, self.opts.meta_timeout)
            .await?;
        let mut src = &payload[..];
        let meta = Metadata::decode(&mut src)?;

        if meta.identity != self.opts.identity {
            debug!(
                "[CONSUMER] skipping frame from producer '{}' (following '{}')",
                meta.identity, self.opts.identity
            );
            return Ok(RecvState::WaitingMeta);
        }

        if let FrameKind::Diff {
            sync_md_offset,
            parent_time,
        } = meta.kind
        {
            if parent_time != view.time() {
                warn!(
                    "[CONSUMER] diff frame against view {parent_time} but working view is {}; \
                     rewinding to last sync",
                    view.time()
                );
                return Ok(RecvState::RewindToSync { sync_md_offset });
            }
        } else {
            // sync frame: this session epoch starts over
            view.clear();
            self.remap.clear();
        }

        Ok(RecvState::ReadingPeers(meta))
    }

    /// Route an intra-frame failure: diffs rewind on timeouts, everything
    /// else surfaces.
    fn frame_failure(meta: Metadata, err: ProtoError) -> Result<RecvState> {
        if let FrameKind::Diff { sync_md_offset, .. } = meta.kind {
            if err.is_frame_recoverable() {
                warn!(
                    "[CONSUMER] abandoning diff frame for view {}: {err}; rewinding to last sync",
                    meta.time
                );
                return Ok(RecvState::RewindToSync { sync_md_offset });
            }
        }
        Err(err)
    }

    async fn read_peers<V>(&mut self, view: &mut V, meta: &Metadata) -> Result<()>
    where
        V: ViewSource + ViewBuilder,
    {
        self.log.seek(TopicId::Peers, meta.peers_offset).await?;
        let mut cursor = FrameCursor::new();
        let mut peers_rx: u16 = 0;

        loop {
            let record = cursor
                .next_record(
                    &mut self.log,
                    TopicId::Peers,
                    self.opts.frame_timeout,
                    decode_peers_record,
                )
                .await?;
            match record {
                PeersStreamRecord::Peer(PeerRecord { remote_id, sig }) => {
                    peers_rx = peers_rx
                        .checked_add(1)
                        .ok_or(ProtoError::FrameMismatch("peer count overflow"))?;
                    let local = view.add_peer(&sig).ok_or(ProtoError::PeerTableFull)?;
                    self.remap.set(remote_id, local);
                }
                PeersStreamRecord::End(end) => {
                    if end.time != meta.time {
                        return Err(ProtoError::FrameMismatch("peers end marker time"));
                    }
                    if end.peer_cnt != peers_rx {
                        return Err(ProtoError::FrameMismatch("peer count"));
                    }
                    return Ok(());
                }
            }
        }
    }

    async fn read_pfxs<V>(&mut self, view: &mut V, meta: &Metadata) -> Result<()>
    where
        V: ViewSource + ViewBuilder,
    {
        self.log.seek(TopicId::Pfxs, meta.pfxs_offset).await?;
        let mut cursor = FrameCursor::new();
        let mut rows_rx: u32 = 0;

        loop {
            let record = cursor
                .next_record(
                    &mut self.log,
                    TopicId::Pfxs,
                    self.opts.frame_timeout,
                    decode_pfxs_record,
                )
                .await?;
            match record {
                PfxsStreamRecord::Row(row) => {
                    rows_rx += 1;
                    self.apply_row(view, &row)?;
                }
                PfxsStreamRecord::End(end) => {
                    if end.time != meta.time {
                        return Err(ProtoError::FrameMismatch("pfxs end marker time"));
                    }
                    if end.row_cnt != rows_rx {
                        return Err(ProtoError::FrameMismatch("row count"));
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Apply one prefix row through the view's mutation interface.
    fn apply_row<V>(&self, view: &mut V, row: &PfxRow) -> Result<()>
    where
        V: ViewSource + ViewBuilder,
    {
        match row.op {
            // sync rows are authoritative and update rows overwrite; with
            // the view cleared at the start of a sync frame both reduce to
            // setting every listed cell
            RowOp::Sync | RowOp::Update => {
                for cell in &row.cells {
                    let local = self
                        .remap
                        .get(cell.peer)
                        .ok_or(ProtoError::UnmappedPeer(cell.peer.0))?;
                    view.set_cell(&row.pfx, local, cell.path);
                }
            }
            RowOp::Remove => {
                if row.cells.is_empty() {
                    view.remove_pfx(&row.pfx);
                    return Ok(());
                }
                for cell in &row.cells {
                    let local = self
                        .remap
                        .get(cell.peer)
                        .ok_or(ProtoError::UnmappedPeer(cell.peer.0))?;
                    view.remove_cell(&row.pfx, local);
                }
                if view.cells(&row.pfx).next().is_none() {
                    view.remove_pfx(&row.pfx);
                }
            }
        }
        Ok(())
    }
}
