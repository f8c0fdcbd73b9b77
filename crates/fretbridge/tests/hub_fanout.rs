//! Integration tests for the broadcast hub under concurrency.
//!
//! # Purpose
//!
//! These tests drive `BroadcastHub` through its public API from several OS
//! threads at once, the way the producer thread and the accept loop share it
//! in the running bridge.  They verify:
//!
//! - Fan-out: N subscribers receive N byte-identical messages.
//! - Race safety: subscribers registering while events are being delivered
//!   never see a duplicated, reordered, or corrupted message.
//! - Pruning: subscribers dropping out mid-stream are removed without the
//!   producer noticing.

use std::net::SocketAddr;
use std::sync::{Arc, Barrier};
use std::thread;

use fretbridge::application::hub::{BroadcastHub, Payload, SubscriberId};
use fretbridge_core::keymap::ControlCode;
use fretbridge_core::protocol::{decode_message, KeyEvent, Transition};
use tokio::sync::mpsc;

fn subscriber(port: u16) -> SubscriberId {
    SubscriberId::from(SocketAddr::from(([127, 0, 0, 1], port)))
}

fn drain_codes(rx: &mut mpsc::Receiver<Payload>) -> Vec<u16> {
    let mut codes = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        let event = decode_message(&payload).expect("every payload is a valid wire message");
        assert_eq!(event.transition, Transition::Pressed);
        codes.push(event.code.value());
    }
    codes
}

#[test]
fn test_fan_out_to_many_subscribers_is_byte_identical() {
    // Arrange
    let hub = BroadcastHub::default();
    let mut receivers: Vec<_> = (0..32).map(|i| hub.register(subscriber(10_000 + i))).collect();

    // Act
    let delivered = hub.deliver(&KeyEvent::pressed(ControlCode::ORANGE));

    // Assert
    assert_eq!(delivered, 32);
    let payloads: Vec<Payload> = receivers
        .iter_mut()
        .map(|rx| rx.try_recv().expect("one message each"))
        .collect();
    assert!(payloads.iter().all(|p| p.as_bytes() == payloads[0].as_bytes()));
    assert_eq!(
        &*payloads[0],
        r#"{"event_type":"key_pressed","keycode":54}"#
    );
}

/// Registers subscribers from several threads while another thread delivers
/// a numbered sequence of events.
///
/// Every subscriber must see a gap-free, duplicate-free run of the sequence
/// that ends with the final event (or nothing, if it registered after the
/// last delivery).
#[test]
fn test_concurrent_registration_during_delivery_is_race_free() {
    const EVENTS: u16 = 2_000;
    const REGISTRARS: u16 = 4;
    const PER_REGISTRAR: u16 = 25;

    // Arrange: queues large enough that nobody is pruned as stalled.
    let hub = Arc::new(BroadcastHub::new(EVENTS as usize + 1));
    let start = Arc::new(Barrier::new(REGISTRARS as usize + 1));

    let producer = {
        let hub = Arc::clone(&hub);
        let start = Arc::clone(&start);
        thread::spawn(move || {
            start.wait();
            for code in 0..EVENTS {
                hub.deliver(&KeyEvent::pressed(ControlCode(code)));
            }
        })
    };

    let registrars: Vec<_> = (0..REGISTRARS)
        .map(|r| {
            let hub = Arc::clone(&hub);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                (0..PER_REGISTRAR)
                    .map(|i| {
                        let rx = hub.register(subscriber(20_000 + r * PER_REGISTRAR + i));
                        thread::yield_now();
                        rx
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    // Act
    let mut receivers: Vec<_> = registrars
        .into_iter()
        .flat_map(|h| h.join().expect("registrar thread"))
        .collect();
    producer.join().expect("producer thread");

    // Assert
    assert_eq!(hub.subscriber_count(), (REGISTRARS * PER_REGISTRAR) as usize);
    for rx in &mut receivers {
        let codes = drain_codes(rx);
        if let Some(&first) = codes.first() {
            let expected: Vec<u16> = (first..EVENTS).collect();
            assert_eq!(codes, expected, "run must be contiguous and end at the last event");
        }
    }
}

#[test]
fn test_subscribers_dropping_mid_stream_are_pruned_silently() {
    // Arrange
    let hub = Arc::new(BroadcastHub::default());
    let mut keep = hub.register(subscriber(30_000));
    let leavers: Vec<_> = (1..=10).map(|i| hub.register(subscriber(30_000 + i))).collect();

    // Act: deliver once with everyone, then drop the leavers and deliver again.
    assert_eq!(hub.deliver(&KeyEvent::pressed(ControlCode::GREEN)), 11);
    drop(leavers);
    let delivered = hub.deliver(&KeyEvent::pressed(ControlCode::RED));

    // Assert
    assert_eq!(delivered, 1);
    assert_eq!(hub.subscriber_count(), 1);
    assert_eq!(drain_codes(&mut keep), vec![47, 46]);
}

#[test]
fn test_unregister_racing_delivery_never_panics() {
    let hub = Arc::new(BroadcastHub::default());
    let ids: Vec<_> = (0..50).map(|i| subscriber(40_000 + i)).collect();
    let _receivers: Vec<_> = ids.iter().map(|id| hub.register(*id)).collect();

    let remover = {
        let hub = Arc::clone(&hub);
        let ids = ids.clone();
        thread::spawn(move || {
            for id in &ids {
                hub.unregister(id);
                hub.unregister(id);
            }
        })
    };
    for _ in 0..200 {
        hub.deliver(&KeyEvent::released(ControlCode::BLUE));
    }
    remover.join().expect("remover thread");

    assert_eq!(hub.subscriber_count(), 0);
}
