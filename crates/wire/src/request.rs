// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use oj_core::JobId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LogsQuery, Query};

/// Request from a client (CLI, HTTP host) to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping.
    Ping,

    /// Version handshake.
    Hello { version: String },

    /// Read-only state query (§6 Control/Log API reads).
    Query { query: Query },

    /// Request daemon shutdown.
    Shutdown,

    /// Daemon status (uptime, active job count).
    Status,

    /// `POST /jobs`: create a job from a type tag and opaque payload.
    CreateJob {
        job_type: String,
        name: String,
        #[serde(default)]
        payload: Value,
        #[serde(default)]
        config: Value,
        #[serde(default)]
        parent_id: Option<JobId>,
        #[serde(default)]
        progress_total: Option<u64>,
    },

    /// `POST /jobs/{id}/cancel`: cooperative cancel.
    CancelJob { id: JobId },

    /// `POST /jobs/{id}/copy`: duplicate configuration with a new id in
    /// `pending`.
    CopyJob { id: JobId },

    /// `DELETE /jobs/{id}`.
    DeleteJob { id: JobId },

    /// `GET /logs/stream`: switches the connection from request/response
    /// into a one-way stream of framed `SseEvent`s (§6 SSE protocol) until
    /// the client disconnects. No `Response` follows a successful
    /// subscribe; a validation failure (bad level, unknown job) replies
    /// with `Response::Error` and the connection returns to request mode.
    SubscribeLogs { query: LogsQuery },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
