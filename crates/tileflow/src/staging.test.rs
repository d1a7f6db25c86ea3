#![cfg(test)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use super::*;
use crate::config::{BufferId, CB_IN0};

const SLOT: usize = 16;

#[test]
fn roundtrip_carries_data() {
    let (mut producer, mut consumer) = staging_pair(CB_IN0, SLOT, 4);
    assert_eq!(producer.id(), CB_IN0);
    assert_eq!(consumer.id(), CB_IN0);
    assert_eq!(producer.slot_bytes(), SLOT);
    assert_eq!(consumer.capacity(), 4);

    producer.reserve(2).unwrap();
    let region = producer.write_region().unwrap();
    assert_eq!(region.len(), 2 * SLOT);
    assert!(region.iter().all(|&b| b == 0), "reserved region starts zeroed");
    for (i, b) in region.iter_mut().enumerate() {
        *b = i as u8;
    }
    producer.publish(2).unwrap();

    consumer.wait(2).unwrap();
    let read = consumer.read_region().unwrap();
    assert!(read.iter().enumerate().all(|(i, &b)| b == i as u8));
    consumer.release(2).unwrap();
}

#[test]
fn reserve_blocks_until_slots_are_released() {
    let (mut producer, mut consumer) = staging_pair(BufferId(3), SLOT, 3);
    let acquired = Arc::new(AtomicBool::new(false));
    let acquired_in_thread = Arc::clone(&acquired);

    producer.reserve(2).unwrap();
    producer.publish(2).unwrap();

    // One slot free, two reserved+filled: the next reserve(2) must block.
    let handle = thread::spawn(move || {
        producer.reserve(2).unwrap();
        acquired_in_thread.store(true, Ordering::SeqCst);
        producer
    });

    thread::sleep(Duration::from_millis(50));
    assert!(!acquired.load(Ordering::SeqCst), "reserve overcommitted the ring");

    consumer.wait(2).unwrap();
    consumer.release(2).unwrap();
    let _producer = handle.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}

#[test]
fn wait_blocks_until_publish() {
    let (mut producer, mut consumer) = staging_pair(BufferId(4), SLOT, 2);
    let published = Arc::new(AtomicBool::new(false));
    let published_for_consumer = Arc::clone(&published);

    let handle = thread::spawn(move || {
        consumer.wait(1).unwrap();
        assert!(
            published_for_consumer.load(Ordering::SeqCst),
            "wait returned before publish"
        );
        consumer.release(1).unwrap();
    });

    thread::sleep(Duration::from_millis(50));
    producer.reserve(1).unwrap();
    published.store(true, Ordering::SeqCst);
    producer.publish(1).unwrap();
    handle.join().unwrap();
}

#[test]
fn protocol_misuse_is_reported() {
    let (mut producer, mut consumer) = staging_pair(BufferId(5), SLOT, 4);

    assert!(matches!(
        producer.reserve(5),
        Err(TileFlowError::ReservationTooLarge { requested: 5, capacity: 4 })
    ));
    assert!(matches!(producer.write_region(), Err(TileFlowError::NoReservation { .. })));
    assert!(matches!(producer.publish(1), Err(TileFlowError::NoReservation { .. })));

    producer.reserve(2).unwrap();
    assert!(matches!(producer.reserve(1), Err(TileFlowError::ReservationActive { .. })));
    assert!(matches!(
        producer.publish(1),
        Err(TileFlowError::PublishMismatch { published: 1, reserved: 2 })
    ));
    producer.publish(2).unwrap();

    assert!(matches!(consumer.read_region(), Err(TileFlowError::NoFilledGroup { .. })));
    assert!(matches!(
        consumer.wait(3),
        Err(TileFlowError::GroupSizeMismatch { requested: 3, available: 2 })
    ));
    consumer.wait(2).unwrap();
    assert!(matches!(consumer.wait(2), Err(TileFlowError::GroupAlreadyHeld { .. })));
    assert!(matches!(
        consumer.release(1),
        Err(TileFlowError::ReleaseMismatch { released: 1, held: 2 })
    ));
    consumer.release(2).unwrap();
    assert!(matches!(consumer.release(2), Err(TileFlowError::NoFilledGroup { .. })));
}

#[test]
fn dropped_consumer_unblocks_the_producer() {
    let (mut producer, consumer) = staging_pair(BufferId(6), SLOT, 1);
    drop(consumer);
    assert!(matches!(producer.reserve(1), Err(TileFlowError::Disconnected { .. })));
}

#[test]
fn dropped_producer_drains_buffered_groups_first() {
    let (mut producer, mut consumer) = staging_pair(BufferId(7), SLOT, 2);
    producer.reserve(2).unwrap();
    producer.publish(2).unwrap();
    drop(producer);

    consumer.wait(2).unwrap();
    consumer.release(2).unwrap();
    assert!(matches!(consumer.wait(2), Err(TileFlowError::Disconnected { .. })));
}

#[test]
fn capacity_is_recycled_across_groups() {
    let (mut producer, mut consumer) = staging_pair(BufferId(8), SLOT, 2);
    for round in 0..8u8 {
        producer.reserve(2).unwrap();
        producer.write_region().unwrap().fill(round);
        producer.publish(2).unwrap();
        consumer.wait(2).unwrap();
        assert!(consumer.read_region().unwrap().iter().all(|&b| b == round));
        consumer.release(2).unwrap();
    }
}
