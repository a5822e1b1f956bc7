//! Typed wire records
//!
//! The three streams carry a small set of record shapes, each introduced by
//! a single ASCII tag byte:
//!
//! - `meta`: one [`Metadata`] record per frame.
//! - `peers`: `'P'` peer records, closed by an `'E'` [`PeersEnd`] marker.
//! - `pfxs`: `'S'`/`'U'`/`'R'` prefix rows, closed by an `'E'` [`PfxsEnd`]
//!   marker. A row carries its cells, the `0xFFFF` end-of-cells sentinel
//!   and a trailing cell count for cross-validation.
//! - `members`: [`MembersRecord`] liveness announcements.

use crate::codec::{
    get_i64, get_path_id, get_pfx, get_str, get_u16, get_u32, get_u8, put_path_id, put_pfx,
    put_str, Result, WireError,
};
use bytes::{BufMut, BytesMut};
use smallvec::SmallVec;
use viewcast_core::options::IDENTITY_MAX_LEN;
use viewcast_core::peer::{Cell, PeerId, PeerSignature};
use viewcast_core::pfx::Prefix;

/// Record tag: a peer description on the `peers` stream.
pub const TAG_PEER: u8 = b'P';
/// Record tag: end-of-frame marker on the `peers` and `pfxs` streams.
pub const TAG_END: u8 = b'E';
/// Frame type tag: self-contained sync frame.
pub const FRAME_SYNC: u8 = b'S';
/// Frame type tag: diff frame against a parent view.
pub const FRAME_DIFF: u8 = b'D';
/// Sentinel peer id closing a row's cell list.
pub const END_OF_CELLS: u16 = 0xFFFF;

/// What a prefix row instructs the consumer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOp {
    /// Authoritative row of a sync frame.
    Sync,
    /// Add or overwrite the listed cells.
    Update,
    /// Remove the listed cells; an empty list removes the whole prefix.
    Remove,
}

impl RowOp {
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Sync => b'S',
            Self::Update => b'U',
            Self::Remove => b'R',
        }
    }

    pub const fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            b'S' => Ok(Self::Sync),
            b'U' => Ok(Self::Update),
            b'R' => Ok(Self::Remove),
            other => Err(WireError::UnknownOp(other)),
        }
    }
}

/// Whether a frame is self-contained or a delta, with the diff back-pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Sync,
    Diff {
        /// `meta` offset of the most recent sync frame.
        sync_md_offset: i64,
        /// Time of the view this diff applies to.
        parent_time: u32,
    },
}

impl FrameKind {
    #[must_use]
    pub const fn is_sync(&self) -> bool {
        matches!(self, Self::Sync)
    }
}

/// One record on the `meta` stream, describing a full frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Identity of the emitting producer.
    pub identity: String,
    /// Time of the view this frame encodes.
    pub time: u32,
    /// First `pfxs` record of the frame.
    pub pfxs_offset: i64,
    /// First `peers` record of the frame.
    pub peers_offset: i64,
    pub kind: FrameKind,
}

impl Metadata {
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        if self.identity.len() > IDENTITY_MAX_LEN {
            return Err(WireError::Malformed("identity too long"));
        }
        put_str(dst, &self.identity)?;
        dst.put_u32(self.time);
        dst.put_i64(self.pfxs_offset);
        dst.put_i64(self.peers_offset);
        match self.kind {
            FrameKind::Sync => dst.put_u8(FRAME_SYNC),
            FrameKind::Diff {
                sync_md_offset,
                parent_time,
            } => {
                dst.put_u8(FRAME_DIFF);
                dst.put_i64(sync_md_offset);
                dst.put_u32(parent_time);
            }
        }
        Ok(())
    }

    pub fn decode(src: &mut &[u8]) -> Result<Self> {
        let identity = get_str(src)?;
        if identity.len() > IDENTITY_MAX_LEN {
            return Err(WireError::Malformed("identity too long"));
        }
        let time = get_u32(src)?;
        let pfxs_offset = get_i64(src)?;
        let peers_offset = get_i64(src)?;
        let kind = match get_u8(src)? {
            FRAME_SYNC => FrameKind::Sync,
            FRAME_DIFF => FrameKind::Diff {
                sync_md_offset: get_i64(src)?,
                parent_time: get_u32(src)?,
            },
            other => return Err(WireError::UnknownOp(other)),
        };
        Ok(Self {
            identity,
            time,
            pfxs_offset,
            peers_offset,
            kind,
        })
    }
}

/// A `'P'` record: one peer and its producer-local id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub remote_id: PeerId,
    pub sig: PeerSignature,
}

impl PeerRecord {
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_u8(TAG_PEER);
        dst.put_u16(self.remote_id.0);
        crate::codec::put_signature(dst, &self.sig)
    }
}

/// End marker of a `peers` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeersEnd {
    pub time: u32,
    pub peer_cnt: u16,
}

impl PeersEnd {
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(TAG_END);
        dst.put_u32(self.time);
        dst.put_u16(self.peer_cnt);
    }
}

/// Any record of the `peers` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeersStreamRecord {
    Peer(PeerRecord),
    End(PeersEnd),
}

/// Decode the next record of a `peers` frame.
pub fn decode_peers_record(src: &mut &[u8]) -> Result<PeersStreamRecord> {
    match get_u8(src)? {
        TAG_PEER => {
            let remote_id = PeerId(get_u16(src)?);
            let sig = crate::codec::get_signature(src)?;
            Ok(PeersStreamRecord::Peer(PeerRecord { remote_id, sig }))
        }
        TAG_END => Ok(PeersStreamRecord::End(PeersEnd {
            time: get_u32(src)?,
            peer_cnt: get_u16(src)?,
        })),
        other => Err(WireError::UnknownOp(other)),
    }
}

/// One prefix row: operation, prefix and cell list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PfxRow {
    pub op: RowOp,
    pub pfx: Prefix,
    pub cells: SmallVec<[Cell; 8]>,
}

impl PfxRow {
    pub fn new(op: RowOp, pfx: Prefix) -> Self {
        Self {
            op,
            pfx,
            cells: SmallVec::new(),
        }
    }

    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        if self.cells.len() >= END_OF_CELLS as usize {
            return Err(WireError::Malformed("too many cells in row"));
        }
        dst.put_u8(self.op.tag());
        put_pfx(dst, &self.pfx);
        for cell in &self.cells {
            dst.put_u16(cell.peer.0);
            put_path_id(dst, &cell.path);
        }
        dst.put_u16(END_OF_CELLS);
        dst.put_u16(self.cells.len() as u16);
        Ok(())
    }
}

/// End marker of a `pfxs` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PfxsEnd {
    pub time: u32,
    /// Number of rows in the frame (a prefix emitting both an update and a
    /// remove row counts twice).
    pub row_cnt: u32,
}

impl PfxsEnd {
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(TAG_END);
        dst.put_u32(self.time);
        dst.put_u32(self.row_cnt);
    }
}

/// Any record of the `pfxs` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PfxsStreamRecord {
    Row(PfxRow),
    End(PfxsEnd),
}

/// Decode the next record of a `pfxs` frame.
pub fn decode_pfxs_record(src: &mut &[u8]) -> Result<PfxsStreamRecord> {
    let tag = get_u8(src)?;
    if tag == TAG_END {
        return Ok(PfxsStreamRecord::End(PfxsEnd {
            time: get_u32(src)?,
            row_cnt: get_u32(src)?,
        }));
    }
    let op = RowOp::from_tag(tag)?;
    let pfx = get_pfx(src)?;
    let mut cells: SmallVec<[Cell; 8]> = SmallVec::new();
    loop {
        let peer = get_u16(src)?;
        if peer == END_OF_CELLS {
            break;
        }
        let path = get_path_id(src)?;
        cells.push(Cell::new(PeerId(peer), path));
    }
    let cell_cnt = get_u16(src)? as usize;
    if cell_cnt != cells.len() {
        return Err(WireError::Malformed("row cell count mismatch"));
    }
    Ok(PfxsStreamRecord::Row(PfxRow { op, pfx, cells }))
}

/// A liveness record on the `members` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembersRecord {
    pub identity: String,
    /// Wall-clock seconds, or 0 when the producer is shutting down.
    pub time: u32,
}

impl MembersRecord {
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        if self.identity.len() > IDENTITY_MAX_LEN {
            return Err(WireError::Malformed("identity too long"));
        }
        put_str(dst, &self.identity)?;
        dst.put_u32(self.time);
        Ok(())
    }

    pub fn decode(src: &mut &[u8]) -> Result<Self> {
        let identity = get_str(src)?;
        let time = get_u32(src)?;
        Ok(Self { identity, time })
    }
}
