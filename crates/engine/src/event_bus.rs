// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Bus (spec §4 implementation notes): in-process typed pub/sub
//! for `job_status_change` and `log_appended` facts. Subscribers (the
//! SSE Broker chief among them) must never be able to stall a
//! publisher — each subscriber gets a bounded channel, and a full
//! channel drops the newest event rather than blocking or disconnecting
//! the subscriber.

use oj_core::Event;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Default bound on a subscriber's event channel (spec §5: "recommended
/// >= 10,000").
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 10_000;

/// Publishes `Event`s to every live subscriber.
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::Sender<Event>>>,
    buffer: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_SUBSCRIBER_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self { subscribers: Mutex::new(Vec::new()), buffer }
    }

    /// Register a new subscriber, returning its receiving end.
    pub fn subscribe(&self) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Publish an event to every subscriber. Never blocks: a subscriber
    /// whose buffer is full has the event dropped (not the subscriber);
    /// a subscriber whose receiver was dropped is pruned from the list.
    pub fn publish(&self, event: Event) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("event bus subscriber buffer full, dropping event");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
