// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-Sent Events envelope for `GET /logs/stream` (§6 SSE protocol).
//!
//! `oj-wire` only defines the event *shape*; the actual `text/event-stream`
//! framing (the `event: .../data: ...\n\n` wire format, header flushing) is
//! the SSE Broker's job in `oj-daemon`, which stays an external-transport
//! concern per the spec's own "HTTP routing is out of scope" non-goal —
//! this type is what the broker serializes into that framing.

use std::collections::HashMap;

use oj_core::{JobId, JobMetadataView, LogEntry};
use serde::{Deserialize, Serialize};

/// One event pushed down a log/status SSE stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SseEvent {
    /// A batch of log entries. The very first `logs` event on a fresh
    /// subscription is the initial backfill (up to `limit` most recent
    /// entries, ascending, display-ready); every subsequent `logs` event
    /// is an incremental delta in append order.
    Logs {
        entries: Vec<LogEntry>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        metadata: HashMap<JobId, JobMetadataView>,
    },

    /// A job or step status change. Always flushes the broker's pending
    /// log batch immediately and resets its adaptive backoff (§6).
    Status {
        job_id: JobId,
        status: oj_core::JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_name: Option<String>,
    },

    /// Heartbeat emitted every 15s of otherwise-idle connection so
    /// intermediaries don't time out the stream.
    Ping,
}

impl SseEvent {
    /// Whether this event type must bypass the broker's batching
    /// interval and flush immediately (§6: "a `status` event always
    /// flushes the pending batch immediately").
    pub fn flushes_immediately(&self) -> bool {
        matches!(self, SseEvent::Status { .. })
    }
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
