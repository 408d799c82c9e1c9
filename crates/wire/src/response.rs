// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use oj_core::{JobId, JobMetadataView, LogEntry, OjError};
use serde::{Deserialize, Serialize};

use super::{JobDetail, JobGroup, JobSummary, StepLogGroup};

/// The failure-status mapping from §6's exit-code table, carried
/// alongside `Response::Error` so a host transport can translate it to
/// an HTTP status without re-deriving it from the message string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    NotFound,
    Validation,
    Precondition,
    Cancelled,
    Io,
    Timeout,
    Invariant,
}

impl From<&OjError> for ErrorStatus {
    fn from(e: &OjError) -> Self {
        match e {
            OjError::NotFound(_) => ErrorStatus::NotFound,
            OjError::Validation(_) => ErrorStatus::Validation,
            OjError::Precondition(_) => ErrorStatus::Precondition,
            OjError::Cancelled(_) => ErrorStatus::Cancelled,
            OjError::Io(_) => ErrorStatus::Io,
            OjError::Timeout(_) => ErrorStatus::Timeout,
            OjError::Invariant(_) => ErrorStatus::Invariant,
        }
    }
}

/// Response from the daemon to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success.
    Ok,

    /// Health check response.
    Pong,

    /// Version handshake response.
    Hello { version: String },

    /// Daemon is shutting down.
    ShuttingDown,

    /// Daemon status.
    Status { uptime_secs: u64, jobs_active: usize },

    /// Error response, carrying enough context for operator diagnosis
    /// per §7's propagation policy.
    Error {
        message: String,
        status: ErrorStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<JobId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        child_count: Option<u64>,
    },

    /// Flat job listing, each entry enriched with child stats.
    Jobs { jobs: Vec<JobSummary> },

    /// Grouped job listing (`grouped=true`): `{parent, children}` groups
    /// plus an `orphans` list for children whose parent isn't on this
    /// page.
    JobGroups { groups: Vec<JobGroup>, orphans: Vec<JobSummary> },

    /// Single job with child stats (if a parent).
    Job { job: Option<Box<JobDetail>> },

    /// `POST /jobs` succeeded.
    JobCreated { job_id: JobId },

    /// `POST /jobs/{id}/cancel` succeeded.
    JobCancelled { job_id: JobId },

    /// `POST /jobs/{id}/copy` succeeded.
    JobCopied { job_id: JobId, source_id: JobId },

    /// `DELETE /jobs/{id}` succeeded.
    JobDeleted { cascade_deleted: u64, child_count: u64 },

    /// `GET /jobs/stats`: global counts by status.
    JobStats { counts: HashMap<String, u64> },

    /// `GET /logs?scope=job` (no `step`): aggregated or single-job logs.
    Logs {
        logs: Vec<LogEntry>,
        count: usize,
        total_count: usize,
        limit: usize,
        order: String,
        level: String,
        include_children: bool,
        metadata: HashMap<JobId, JobMetadataView>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_cursor: Option<String>,
    },

    /// `GET /logs?scope=job&step=...`: logs grouped by step.
    StepGroupedLogs { job_id: JobId, steps: Vec<StepLogGroup> },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
