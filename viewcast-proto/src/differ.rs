//! Producer snapshot differ
//!
//! Walks the current view (and, for diff frames, the parent view) and emits
//! prefix rows describing what a consumer must change to reach the current
//! snapshot. The differ performs no I/O: completed rows go to a [`RowSink`],
//! and the publisher's frame writer decides how rows pack into broker
//! messages.
//!
//! The filter is re-evaluated against the parent view for every entity.
//! This is what keeps filtered sends coherent: a prefix the user never
//! transmitted must not produce a remove row when it disappears, and a
//! prefix that just started matching the filter must be sent whole.

use crate::error::{ProtoError, Result};
use crate::record::{PfxRow, RowOp};
use crate::stats::SendStats;
use async_trait::async_trait;
use bytes::BytesMut;
use viewcast_core::filter::{FilterScope, Verdict, ViewFilter};
use viewcast_core::peer::Cell;
use viewcast_core::pfx::Prefix;
use viewcast_core::view::ViewSource;

/// Receives completed rows from the differ.
#[async_trait(?Send)]
pub trait RowSink {
    async fn row(&mut self, row: &[u8]) -> Result<()>;
}

/// An optional user filter with abort handling folded in.
pub(crate) struct SendFilter<'a> {
    inner: Option<&'a mut dyn ViewFilter>,
}

impl<'a> SendFilter<'a> {
    pub(crate) fn new(inner: Option<&'a mut dyn ViewFilter>) -> Self {
        Self { inner }
    }

    /// `Ok(true)` to transmit, `Ok(false)` to omit, `Err` on abort.
    pub(crate) fn check(&mut self, scope: FilterScope<'_>) -> Result<bool> {
        match &mut self.inner {
            None => Ok(true),
            Some(filter) => match filter.check(scope) {
                Verdict::Include => Ok(true),
                Verdict::Skip => Ok(false),
                Verdict::Abort => Err(ProtoError::FilterAbort),
            },
        }
    }
}

async fn push_row<S: RowSink>(sink: &mut S, scratch: &mut BytesMut, row: &PfxRow) -> Result<()> {
    scratch.clear();
    row.encode(scratch)?;
    sink.row(scratch).await
}

/// Collect the filtered active cells of `pfx` into a row.
fn collect_row<V: ViewSource + ?Sized>(
    view: &V,
    pfx: Prefix,
    op: RowOp,
    filter: &mut SendFilter<'_>,
) -> Result<PfxRow> {
    let mut row = PfxRow::new(op, pfx);
    for cell in view.cells(&pfx) {
        if filter.check(FilterScope::PfxPeer(&pfx, cell.peer))? {
            row.cells.push(cell);
        }
    }
    Ok(row)
}

/// Emit every active prefix of `view` as an authoritative `'S'` row.
pub(crate) async fn emit_sync<V, S>(
    view: &V,
    filter: &mut SendFilter<'_>,
    sink: &mut S,
    stats: &mut SendStats,
    scratch: &mut BytesMut,
) -> Result<()>
where
    V: ViewSource + ?Sized,
    S: RowSink,
{
    for pfx in view.prefixes() {
        if !filter.check(FilterScope::Pfx(&pfx))? {
            continue;
        }
        let row = collect_row(view, pfx, RowOp::Sync, filter)?;
        if row.cells.is_empty() {
            continue;
        }
        stats.pfx_cnt += 1;
        stats.sync_pfx_cnt += 1;
        push_row(sink, scratch, &row).await?;
    }
    Ok(())
}

/// Emit the rows that turn `parent` into `current`.
pub(crate) async fn emit_diff<V, S>(
    current: &V,
    parent: &V,
    filter: &mut SendFilter<'_>,
    sink: &mut S,
    stats: &mut SendStats,
    scratch: &mut BytesMut,
) -> Result<()>
where
    V: ViewSource + ?Sized,
    S: RowSink,
{
    // outer pass: every active prefix of the current view
    for pfx in current.prefixes() {
        let send_this = filter.check(FilterScope::Pfx(&pfx))?;
        // "was it sent last time": the filter re-run against the parent
        let parent_sent = parent.has_pfx(&pfx) && filter.check(FilterScope::Pfx(&pfx))?;

        if parent_sent && send_this {
            diff_cells(current, parent, pfx, filter, sink, stats, scratch).await?;
        } else if parent_sent {
            // the prefix fell out of the filter: remove what was sent
            let row = collect_row(parent, pfx, RowOp::Remove, filter)?;
            if !row.cells.is_empty() {
                stats.removed_pfxs_cnt += 1;
                stats.removed_pfx_peer_cnt += row.cells.len() as u32;
                stats.pfx_cnt += 1;
                push_row(sink, scratch, &row).await?;
            }
        } else if send_this {
            // new prefix: send all of it
            let row = collect_row(current, pfx, RowOp::Update, filter)?;
            if !row.cells.is_empty() {
                stats.added_pfxs_cnt += 1;
                stats.added_pfx_peer_cnt += row.cells.len() as u32;
                stats.pfx_cnt += 1;
                push_row(sink, scratch, &row).await?;
            }
        }
    }

    // removal pass: prefixes that exist only in the parent view
    for pfx in parent.prefixes() {
        if !filter.check(FilterScope::Pfx(&pfx))? {
            continue;
        }
        if current.has_pfx(&pfx) {
            continue;
        }
        let row = collect_row(parent, pfx, RowOp::Remove, filter)?;
        if !row.cells.is_empty() {
            stats.removed_pfxs_cnt += 1;
            stats.removed_pfx_peer_cnt += row.cells.len() as u32;
            stats.pfx_cnt += 1;
            push_row(sink, scratch, &row).await?;
        }
    }

    Ok(())
}

/// Cellular diff of one prefix present in both views.
async fn diff_cells<V, S>(
    current: &V,
    parent: &V,
    pfx: Prefix,
    filter: &mut SendFilter<'_>,
    sink: &mut S,
    stats: &mut SendStats,
    scratch: &mut BytesMut,
) -> Result<()>
where
    V: ViewSource + ?Sized,
    S: RowSink,
{
    let mut upd = PfxRow::new(RowOp::Update, pfx);
    let mut rem = PfxRow::new(RowOp::Remove, pfx);

    // cells of the current view: additions and path changes
    for cell in current.cells(&pfx) {
        let send_this = filter.check(FilterScope::PfxPeer(&pfx, cell.peer))?;
        let parent_path = parent.cell(&pfx, cell.peer);
        let parent_sent = match parent_path {
            Some(_) => filter.check(FilterScope::PfxPeer(&pfx, cell.peer))?,
            None => false,
        };

        match (parent_sent, send_this) {
            (true, true) => {
                if parent_path != Some(cell.path) {
                    stats.changed_pfx_peer_cnt += 1;
                    upd.cells.push(cell);
                }
            }
            (true, false) => {
                // the cell fell out of the filter
                if let Some(path) = parent_path {
                    stats.removed_pfx_peer_cnt += 1;
                    rem.cells.push(Cell::new(cell.peer, path));
                }
            }
            (false, true) => {
                stats.added_pfx_peer_cnt += 1;
                upd.cells.push(cell);
            }
            (false, false) => {}
        }
    }

    // cells of the parent view that vanished from the current one
    for cell in parent.cells(&pfx) {
        if !filter.check(FilterScope::PfxPeer(&pfx, cell.peer))? {
            continue;
        }
        if current.cell(&pfx, cell.peer).is_none() {
            stats.removed_pfx_peer_cnt += 1;
            rem.cells.push(cell);
        }
    }

    let changed = !upd.cells.is_empty() || !rem.cells.is_empty();
    if !upd.cells.is_empty() {
        stats.pfx_cnt += 1;
        push_row(sink, scratch, &upd).await?;
    }
    if !rem.cells.is_empty() {
        stats.pfx_cnt += 1;
        push_row(sink, scratch, &rem).await?;
    }
    if changed {
        stats.changed_pfxs_cnt += 1;
    }
    stats.common_pfxs_cnt += 1;

    Ok(())
}
