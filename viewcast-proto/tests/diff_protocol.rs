//! Diff-frame protocol tests: the end-to-end scenarios of the replication
//! design, driven through a producer and consumer sharing an in-memory
//! broker.

mod common;

use common::{consumer_opts, producer_opts, view_with};
use viewcast_core::log::{TopicId, ViewLog};
use viewcast_core::memlog::MemLog;
use viewcast_core::memview::MemView;
use viewcast_core::pfx::Prefix;
use viewcast_core::view::ViewSource;
use viewcast_proto::record::{decode_pfxs_record, PfxsStreamRecord, RowOp};
use viewcast_proto::{Consumer, Producer};

/// Receive `frames` deliveries into `view`.
async fn catch_up(consumer: &mut Consumer<MemLog>, view: &mut MemView, frames: usize) {
    for _ in 0..frames {
        consumer.recv_view(view).await.unwrap();
    }
}

#[compio::test]
async fn empty_view_to_one_prefix() {
    let log = MemLog::new();
    let pfx = Prefix::v4(10, 0, 0, 0, 8);
    let v0 = view_with(100, &[]);
    let v1 = view_with(200, &[(pfx, 1, 0xA)]);

    let mut producer = Producer::new(log.clone(), producer_opts());
    let s0 = *producer.send_view(&v0, None, None).await.unwrap();
    assert_eq!(s0.sync_pfx_cnt, 0);
    assert_eq!(s0.pfx_cnt, 0);

    let s1 = *producer.send_view(&v1, Some(&v0), None).await.unwrap();
    assert_eq!(s1.added_pfxs_cnt, 1);
    assert_eq!(s1.common_pfxs_cnt, 0);
    assert_eq!(s1.added_pfx_peer_cnt, 1);
    assert_eq!(s1.pfx_cnt, 1);

    let mut consumer = Consumer::new(log.clone(), consumer_opts());
    let mut rebuilt = MemView::new();
    catch_up(&mut consumer, &mut rebuilt, 2).await;
    assert_eq!(rebuilt.export(), v1.export());
    assert_eq!(rebuilt.active_peer_cnt(), 1);
}

#[compio::test]
async fn path_change_travels_as_one_cell() {
    let log = MemLog::new();
    let pfx = Prefix::v4(10, 0, 0, 0, 8);
    let v0 = view_with(100, &[(pfx, 1, 0xA)]);
    let v1 = view_with(200, &[(pfx, 1, 0xB)]);

    let mut producer = Producer::new(log.clone(), producer_opts());
    producer.send_view(&v0, None, None).await.unwrap();
    let s1 = *producer.send_view(&v1, Some(&v0), None).await.unwrap();
    assert_eq!(s1.changed_pfx_peer_cnt, 1);
    assert_eq!(s1.changed_pfxs_cnt, 1);
    assert_eq!(s1.common_pfxs_cnt, 1);
    assert_eq!(s1.added_pfx_peer_cnt, 0);
    assert_eq!(s1.removed_pfx_peer_cnt, 0);

    let mut consumer = Consumer::new(log.clone(), consumer_opts());
    let mut rebuilt = MemView::new();
    catch_up(&mut consumer, &mut rebuilt, 2).await;
    assert_eq!(rebuilt.export(), v1.export());
}

#[compio::test]
async fn removed_prefix_deactivates_on_the_consumer() {
    let log = MemLog::new();
    let keep = Prefix::v4(10, 0, 0, 0, 8);
    let gone = Prefix::v4(20, 0, 0, 0, 8);
    let v0 = view_with(100, &[(keep, 1, 0xA), (gone, 1, 0xA)]);
    let v1 = view_with(200, &[(keep, 1, 0xA)]);

    let mut producer = Producer::new(log.clone(), producer_opts());
    producer.send_view(&v0, None, None).await.unwrap();
    let s1 = *producer.send_view(&v1, Some(&v0), None).await.unwrap();
    assert_eq!(s1.removed_pfxs_cnt, 1);
    assert_eq!(s1.pfx_cnt, 1);

    let mut consumer = Consumer::new(log.clone(), consumer_opts());
    let mut rebuilt = MemView::new();
    catch_up(&mut consumer, &mut rebuilt, 2).await;
    assert_eq!(rebuilt.export(), v1.export());
    assert!(!rebuilt.has_pfx(&gone));
    assert!(rebuilt.has_pfx(&keep));
}

#[compio::test]
async fn peer_that_lost_all_prefixes_is_deactivated() {
    let log = MemLog::new();
    let pfx = Prefix::v4(10, 0, 0, 0, 8);
    let v0 = view_with(100, &[(pfx, 1, 0xA), (pfx, 2, 0xB)]);
    let v1 = view_with(200, &[(pfx, 1, 0xA)]);

    let mut producer = Producer::new(log.clone(), producer_opts());
    producer.send_view(&v0, None, None).await.unwrap();
    let s1 = *producer.send_view(&v1, Some(&v0), None).await.unwrap();
    assert_eq!(s1.removed_pfx_peer_cnt, 1);
    assert_eq!(s1.changed_pfxs_cnt, 1);

    let mut consumer = Consumer::new(log.clone(), consumer_opts());
    let mut rebuilt = MemView::new();
    catch_up(&mut consumer, &mut rebuilt, 2).await;
    assert_eq!(rebuilt.export(), v1.export());
    // the post-frame sweep retires peer 2
    assert_eq!(rebuilt.active_peer_cnt(), 1);
}

#[compio::test]
async fn single_cell_change_emits_exactly_one_update_row() {
    let log = MemLog::new();
    let pfx = Prefix::v4(10, 0, 0, 0, 8);
    let other = Prefix::v4(20, 0, 0, 0, 8);
    let v0 = view_with(100, &[(pfx, 1, 0xA), (other, 2, 0xC)]);
    let v1 = view_with(200, &[(pfx, 1, 0xB), (other, 2, 0xC)]);

    let mut producer = Producer::new(log.clone(), producer_opts());
    producer.send_view(&v0, None, None).await.unwrap();

    let mut probe = log.clone();
    let diff_start = probe.next_offset(TopicId::Pfxs).await.unwrap();
    producer.send_view(&v1, Some(&v0), None).await.unwrap();

    // decode the raw diff frame: one 'U' row with one cell, then the end
    // marker, and not a single 'R' row
    probe.seek(TopicId::Pfxs, diff_start).await.unwrap();
    let msg = probe
        .consume(TopicId::Pfxs, std::time::Duration::from_millis(50))
        .await
        .unwrap();
    let mut src = &msg[..];

    let mut rows = Vec::new();
    loop {
        match decode_pfxs_record(&mut src).unwrap() {
            PfxsStreamRecord::Row(row) => rows.push(row),
            PfxsStreamRecord::End(end) => {
                assert_eq!(end.time, 200);
                assert_eq!(end.row_cnt, rows.len() as u32);
                break;
            }
        }
    }
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].op, RowOp::Update);
    assert_eq!(rows[0].pfx, pfx);
    assert_eq!(rows[0].cells.len(), 1);
}

#[compio::test]
async fn unchanged_common_prefixes_emit_nothing() {
    let log = MemLog::new();
    let v0 = view_with(
        100,
        &[
            (Prefix::v4(10, 0, 0, 0, 8), 1, 0xA),
            (Prefix::v4(20, 0, 0, 0, 8), 2, 0xB),
        ],
    );
    let v1 = view_with(
        200,
        &[
            (Prefix::v4(10, 0, 0, 0, 8), 1, 0xA),
            (Prefix::v4(20, 0, 0, 0, 8), 2, 0xB),
        ],
    );

    let mut producer = Producer::new(log.clone(), producer_opts());
    producer.send_view(&v0, None, None).await.unwrap();
    let s1 = *producer.send_view(&v1, Some(&v0), None).await.unwrap();
    assert_eq!(s1.common_pfxs_cnt, 2);
    assert_eq!(s1.changed_pfxs_cnt, 0);
    assert_eq!(s1.pfx_cnt, 0);

    let mut consumer = Consumer::new(log.clone(), consumer_opts());
    let mut rebuilt = MemView::new();
    catch_up(&mut consumer, &mut rebuilt, 2).await;
    assert_eq!(rebuilt.export(), v1.export());
    assert_eq!(rebuilt.time(), 200);
}
