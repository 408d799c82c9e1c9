// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_core::JobId;

fn sample_event() -> Event {
    Event::JobStarted { job_id: JobId::new(), epoch_ms: 1 }
}

#[tokio::test]
async fn delivers_published_events_to_every_subscriber() {
    let bus = EventBus::new();
    let mut a = bus.subscribe();
    let mut b = bus.subscribe();

    bus.publish(sample_event());

    assert!(a.recv().await.is_some());
    assert!(b.recv().await.is_some());
}

#[tokio::test]
async fn drops_the_newest_event_when_a_subscriber_buffer_is_full() {
    let bus = EventBus::with_buffer(1);
    let mut rx = bus.subscribe();

    bus.publish(sample_event());
    bus.publish(sample_event()); // buffer already full, dropped

    assert!(rx.recv().await.is_some());
    assert!(rx.try_recv().is_err());
    assert_eq!(bus.subscriber_count(), 1);
}

#[tokio::test]
async fn prunes_subscribers_whose_receiver_was_dropped() {
    let bus = EventBus::new();
    let rx = bus.subscribe();
    drop(rx);

    bus.publish(sample_event());

    assert_eq!(bus.subscriber_count(), 0);
}
