// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSE Broker (spec §4.9/§6): owns the process-scoped table of live log
//! stream subscribers, batches incoming log entries per subscriber on an
//! adaptive interval, and emits heartbeats during idle gaps. Transport
//! framing (`text/event-stream` headers, `event:`/`data:` lines) is left
//! to whatever host serializes `SseEvent`s onto the wire — this type
//! only owns the subscriber table and batching policy (§9: "implement
//! [the live subscriber set] as an explicitly owned structure held by
//! the SSE Broker, not as ambient globals").

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use oj_core::{Clock, JobId, JobMetadataView, JobStatus, LevelFilter, LogEntry};
use oj_wire::SseEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

pub type SubscriberId = u64;

/// A subscriber's adaptive batch interval ladder position and pending
/// entries, advanced by `SseBroker::tick`.
struct Subscriber {
    sender: mpsc::Sender<SseEvent>,
    jobs: HashSet<JobId>,
    level: LevelFilter,
    pending: Vec<LogEntry>,
    metadata: HashMap<JobId, JobMetadataView>,
    ladder_index: usize,
    entries_since_flush: usize,
    last_activity_ms: u64,
    last_flush_ms: u64,
}

/// Handle returned by `subscribe`: the id (for `unsubscribe`) and the
/// receiving half of the subscriber's bounded channel.
pub struct SseSubscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<SseEvent>,
}

pub struct SseBrokerConfig {
    pub buffer: usize,
    pub backoff_ladder_ms: Vec<u64>,
    pub escalate_threshold: usize,
    pub deescalate_threshold: usize,
    pub heartbeat_ms: u64,
}

pub struct SseBroker<C: Clock> {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
    clock: C,
    config: SseBrokerConfig,
}

impl<C: Clock> SseBroker<C> {
    pub fn new(clock: C, config: SseBrokerConfig) -> Self {
        Self { subscribers: Mutex::new(HashMap::new()), next_id: AtomicU64::new(1), clock, config }
    }

    /// Register a new subscriber scoped to `jobs` (the contributing job
    /// set computed once at subscribe time, per the Log Service's own
    /// `contributing_jobs`) and `level`. `initial_batch` is the first
    /// `logs` event (§6: "up to `limit` most recent entries... ascending
    /// order, display-ready"), sent before the subscription starts
    /// receiving live deltas.
    pub fn subscribe(
        &self,
        jobs: HashSet<JobId>,
        level: LevelFilter,
        initial_batch: Vec<LogEntry>,
        initial_metadata: HashMap<JobId, JobMetadataView>,
    ) -> SseSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.config.buffer);
        if !initial_batch.is_empty() || !initial_metadata.is_empty() {
            let _ = sender.try_send(SseEvent::Logs { entries: initial_batch, metadata: initial_metadata });
        }
        let subscriber = Subscriber {
            sender,
            jobs,
            level,
            pending: Vec::new(),
            metadata: HashMap::new(),
            ladder_index: 0,
            entries_since_flush: 0,
            last_activity_ms: self.clock.epoch_ms(),
            last_flush_ms: self.clock.epoch_ms(),
        };
        self.subscribers.lock().insert(id, subscriber);
        SseSubscription { id, receiver }
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.lock().remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// A new log entry was appended. Delivered to every subscriber whose
    /// job set contains it and whose level filter admits it; batched,
    /// not sent immediately (§6 adaptive backoff).
    pub fn notify_log(&self, entry: LogEntry, metadata: Option<JobMetadataView>) {
        let mut subscribers = self.subscribers.lock();
        for subscriber in subscribers.values_mut() {
            if !subscriber.jobs.contains(&entry.job_id) || !subscriber.level.matches(entry.level) {
                continue;
            }
            if let Some(meta) = &metadata {
                subscriber.metadata.insert(entry.job_id, meta.clone());
            }
            subscriber.pending.push(entry.clone());
            subscriber.entries_since_flush += 1;
        }
    }

    /// A job or step status changed. Always flushes the subscriber's
    /// pending batch immediately and resets its backoff to the ladder's
    /// base rung (§6).
    pub fn notify_status(&self, job_id: JobId, status: JobStatus, step_name: Option<String>) {
        let now = self.clock.epoch_ms();
        let mut subscribers = self.subscribers.lock();
        for subscriber in subscribers.values_mut() {
            if !subscriber.jobs.contains(&job_id) {
                continue;
            }
            flush(subscriber, now);
            subscriber.ladder_index = 0;
            subscriber.entries_since_flush = 0;
            send(subscriber, SseEvent::Status { job_id, status, step_name: step_name.clone() }, now);
        }
    }

    /// Drive batching and heartbeats. Callers spawn a loop that calls
    /// this on a short tick (e.g. every 100 ms); subscribers flush only
    /// when their own adaptive interval has elapsed.
    pub fn tick(&self) {
        let now = self.clock.epoch_ms();
        let mut subscribers = self.subscribers.lock();
        for subscriber in subscribers.values_mut() {
            let interval = current_interval_ms(&self.config, subscriber.ladder_index);
            let due = now.saturating_sub(subscriber.last_flush_ms) >= interval;
            if !subscriber.pending.is_empty() && due {
                let entries_this_interval = subscriber.entries_since_flush;
                flush(subscriber, now);
                subscriber.ladder_index = next_ladder_index(&self.config, subscriber.ladder_index, entries_this_interval);
                subscriber.entries_since_flush = 0;
            } else if subscriber.pending.is_empty() && now.saturating_sub(subscriber.last_activity_ms) >= self.config.heartbeat_ms {
                send(subscriber, SseEvent::Ping, now);
            }
        }
    }
}

fn flush(subscriber: &mut Subscriber, now_ms: u64) {
    if subscriber.pending.is_empty() {
        return;
    }
    let entries = std::mem::take(&mut subscriber.pending);
    let metadata = subscriber.metadata.clone();
    subscriber.last_flush_ms = now_ms;
    send(subscriber, SseEvent::Logs { entries, metadata }, now_ms);
}

/// Drop-newest-on-full policy (§6): never block the publisher, never
/// drop the subscriber, only the entry that didn't fit.
fn send(subscriber: &mut Subscriber, event: SseEvent, now_ms: u64) {
    subscriber.last_activity_ms = now_ms;
    if subscriber.sender.try_send(event).is_err() {
        warn!("sse subscriber buffer full, dropping event");
    }
}

fn current_interval_ms(config: &SseBrokerConfig, ladder_index: usize) -> u64 {
    config.backoff_ladder_ms.get(ladder_index).copied().unwrap_or_else(|| {
        config.backoff_ladder_ms.last().copied().unwrap_or(500)
    })
}

/// Pure ladder-advance rule (§6): escalate one rung when more than
/// `escalate_threshold` entries arrived in the interval just flushed,
/// step back one rung when fewer than `deescalate_threshold` arrived,
/// otherwise hold.
fn next_ladder_index(config: &SseBrokerConfig, current: usize, entries_in_interval: usize) -> usize {
    let max = config.backoff_ladder_ms.len().saturating_sub(1);
    if entries_in_interval > config.escalate_threshold {
        (current + 1).min(max)
    } else if entries_in_interval < config.deescalate_threshold {
        current.saturating_sub(1)
    } else {
        current
    }
}

#[cfg(test)]
#[path = "sse_broker_tests.rs"]
mod tests;
