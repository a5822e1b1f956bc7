//! Sync-frame round-trip tests: a consumer must rebuild the producer's
//! view cell-for-cell, including activation state.

mod common;

use common::{consumer_opts, producer_opts, sig, view_with};
use viewcast_core::filter::{FilterScope, Verdict};
use viewcast_core::memlog::MemLog;
use viewcast_core::memview::MemView;
use viewcast_core::pfx::Prefix;
use viewcast_core::view::ViewSource;
use viewcast_proto::{Consumer, Producer};

#[compio::test]
async fn sync_roundtrip_rebuilds_the_view() {
    let log = MemLog::new();
    let view = view_with(
        1_700_000_000,
        &[
            (Prefix::v4(10, 0, 0, 0, 8), 1, 0xA1),
            (Prefix::v4(10, 0, 0, 0, 8), 2, 0xA2),
            (Prefix::v4(172, 16, 0, 0, 12), 2, 0xB1),
            (Prefix::v6([0x2001, 0xdb8, 0, 0, 0, 0, 0, 0], 32), 1, 0xC1),
        ],
    );

    let mut producer = Producer::new(log.clone(), producer_opts());
    let stats = *producer.send_view(&view, None, None).await.unwrap();
    assert_eq!(stats.sync_pfx_cnt, 3);
    assert_eq!(stats.pfx_cnt, 3);

    let mut consumer = Consumer::new(log.clone(), consumer_opts());
    let mut rebuilt = MemView::new();
    let delivery = consumer.recv_view(&mut rebuilt).await.unwrap();

    assert!(delivery.sync);
    assert_eq!(delivery.time, 1_700_000_000);
    assert_eq!(rebuilt.time(), 1_700_000_000);
    assert_eq!(rebuilt.export(), view.export());
    assert_eq!(rebuilt.active_peer_cnt(), 2);
}

#[compio::test]
async fn empty_view_roundtrips() {
    let log = MemLog::new();
    let view = view_with(500, &[]);

    let mut producer = Producer::new(log.clone(), producer_opts());
    let stats = *producer.send_view(&view, None, None).await.unwrap();
    assert_eq!(stats.sync_pfx_cnt, 0);

    let mut consumer = Consumer::new(log.clone(), consumer_opts());
    let mut rebuilt = MemView::new();
    let delivery = consumer.recv_view(&mut rebuilt).await.unwrap();
    assert_eq!(delivery.time, 500);
    assert_eq!(rebuilt.active_peer_cnt(), 0);
    assert_eq!(rebuilt.active_pfx_cnt(), 0);
}

#[compio::test]
async fn consuming_the_same_sync_frame_twice_is_idempotent() {
    let log = MemLog::new();
    let view = view_with(900, &[(Prefix::v4(10, 0, 0, 0, 8), 1, 0xA)]);

    let mut producer = Producer::new(log.clone(), producer_opts());
    producer.send_view(&view, None, None).await.unwrap();

    let mut rebuilt = MemView::new();
    let mut first = Consumer::new(log.clone(), consumer_opts());
    first.recv_view(&mut rebuilt).await.unwrap();
    let after_first = rebuilt.export();

    // a second session re-reads the same frame into the same view
    let mut second = Consumer::new(log.clone(), consumer_opts());
    second.recv_view(&mut rebuilt).await.unwrap();
    assert_eq!(rebuilt.export(), after_first);
    assert_eq!(rebuilt.export(), view.export());
}

#[compio::test]
async fn filtered_entities_are_not_transmitted() {
    let log = MemLog::new();
    let visible = Prefix::v4(10, 0, 0, 0, 8);
    let hidden = Prefix::v4(20, 0, 0, 0, 8);
    let view = view_with(700, &[(visible, 1, 0xA), (visible, 2, 0xB), (hidden, 1, 0xC)]);

    // peer 2 never gets sent, and neither do its cells or the hidden prefix;
    // view_with assigns local ids in insertion order
    let skip_sig = sig(2);
    let skip_id = viewcast_core::peer::PeerId(2);
    let mut filter = |scope: FilterScope<'_>| match scope {
        FilterScope::Peer(s) if *s == skip_sig => Verdict::Skip,
        FilterScope::Pfx(p) if *p == hidden => Verdict::Skip,
        FilterScope::PfxPeer(_, id) if id == skip_id => Verdict::Skip,
        _ => Verdict::Include,
    };

    let mut producer = Producer::new(log.clone(), producer_opts());
    producer
        .send_view(&view, None, Some(&mut filter))
        .await
        .unwrap();

    let mut consumer = Consumer::new(log.clone(), consumer_opts());
    let mut rebuilt = MemView::new();
    consumer.recv_view(&mut rebuilt).await.unwrap();

    assert_eq!(rebuilt.active_peer_cnt(), 1);
    assert_eq!(rebuilt.active_pfx_cnt(), 1);
    assert!(rebuilt.export().cells.keys().all(|(p, s)| *p == visible && *s == sig(1)));
}
