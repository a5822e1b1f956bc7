//! Integration tests for producer/consumer options

use std::time::Duration;
use viewcast_core::options::{
    ConsumerOptions, ProducerOptions, DEFAULT_FRAME_TIMEOUT, DEFAULT_MAX_DIFFS,
    DEFAULT_MESSAGE_CAPACITY, DEFAULT_META_TIMEOUT,
};

#[test]
fn producer_defaults() {
    let opts = ProducerOptions::new("rv-collector-1");
    assert_eq!(opts.identity, "rv-collector-1");
    assert_eq!(opts.max_diffs, DEFAULT_MAX_DIFFS);
    assert_eq!(opts.members_interval, Duration::from_secs(3600));
    assert_eq!(opts.message_capacity, DEFAULT_MESSAGE_CAPACITY);
}

#[test]
fn producer_builders() {
    let opts = ProducerOptions::new("p")
        .with_max_diffs(2)
        .with_members_interval(Duration::from_secs(60))
        .with_message_capacity(1024);
    assert_eq!(opts.max_diffs, 2);
    assert_eq!(opts.members_interval, Duration::from_secs(60));
    assert_eq!(opts.message_capacity, 1024);
}

#[test]
fn consumer_defaults() {
    let opts = ConsumerOptions::new("p");
    assert_eq!(opts.meta_timeout, DEFAULT_META_TIMEOUT);
    assert_eq!(opts.frame_timeout, DEFAULT_FRAME_TIMEOUT);
}

#[test]
fn consumer_builders() {
    let opts = ConsumerOptions::new("p")
        .with_meta_timeout(Duration::from_millis(250))
        .with_frame_timeout(Duration::from_millis(50));
    assert_eq!(opts.meta_timeout, Duration::from_millis(250));
    assert_eq!(opts.frame_timeout, Duration::from_millis(50));
}
