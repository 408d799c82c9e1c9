// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types — facts about what happened, replayed to derive state.
//!
//! Event sourcing: the `MaterializedState` in `oj-storage` is entirely
//! derived by folding these events over an append-only WAL. Handlers that
//! apply an `Event` to state MUST be idempotent; the same event may be
//! applied twice (once for immediate visibility, once during WAL replay).

use crate::job::{Job, JobStatus};
use crate::job::JobId;
use crate::log::{LogEntry, OpenMap};
use serde::{Deserialize, Serialize};

/// Facts the core emits. Tagged on the wire so a log/WAL reader can
/// dispatch on `event` without deserializing the whole enum speculatively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A job was created (root or child). Carries the full initial
    /// record rather than just an id so replay doesn't need a separate
    /// "job defaults" lookup.
    JobCreated { job: Job },

    /// A job transitioned to `running`.
    JobStarted { job_id: JobId, epoch_ms: u64 },

    /// A job transitioned to `completed`.
    JobCompleted { job_id: JobId, epoch_ms: u64 },

    /// A job transitioned to `failed`.
    JobFailed { job_id: JobId, error: String, epoch_ms: u64 },

    /// Cascading cancellation has been requested for this job (and will
    /// be requested for its non-terminal descendants); status is not yet
    /// terminal until `JobCancelled` follows.
    JobCancelling { job_id: JobId, epoch_ms: u64 },

    /// A job transitioned to `cancelled` (terminal).
    JobCancelled { job_id: JobId, epoch_ms: u64 },

    /// Progress and/or open metadata was updated on a running job.
    JobProgress {
        job_id: JobId,
        progress_current: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress_total: Option<u64>,
    },

    /// Executor-produced facts merged into the job's open metadata map
    /// (e.g. `document_count`).
    JobMetadataUpdated { job_id: JobId, metadata: OpenMap },

    /// A job (and, per the cascade invariant, everything beneath it) was
    /// deleted. `cascade_count` is the total number of jobs removed,
    /// including `job_id` itself.
    JobDeleted { job_id: JobId, cascade_count: u64 },

    /// The Orchestrator advanced a workflow's current step.
    StepStarted {
        job_id: JobId,
        step_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        epoch_ms: u64,
    },

    StepCompleted { job_id: JobId, step_name: String, epoch_ms: u64 },

    StepFailed { job_id: JobId, step_name: String, error: String, epoch_ms: u64 },

    /// A structured log line was appended. Published on the
    /// `log_appended` Event Bus topic for the SSE Broker to fan out.
    LogAppended { entry: LogEntry },

    /// Forward-compatible escape hatch; never produced by this
    /// implementation, kept so downstream consumers of a WAL segment
    /// written by a newer version don't hard-fail on an unknown tag.
    Custom,
}

impl Event {
    /// The job this event concerns, if any (events are otherwise
    /// process-wide, e.g. `Custom`).
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Event::JobCreated { job } => Some(&job.id),
            Event::JobStarted { job_id, .. }
            | Event::JobCompleted { job_id, .. }
            | Event::JobFailed { job_id, .. }
            | Event::JobCancelling { job_id, .. }
            | Event::JobCancelled { job_id, .. }
            | Event::JobProgress { job_id, .. }
            | Event::JobMetadataUpdated { job_id, .. }
            | Event::JobDeleted { job_id, .. }
            | Event::StepStarted { job_id, .. }
            | Event::StepCompleted { job_id, .. }
            | Event::StepFailed { job_id, .. } => Some(job_id),
            Event::LogAppended { entry } => Some(&entry.job_id),
            Event::Custom => None,
        }
    }

    /// The terminal `JobStatus` this event settles on, if it represents a
    /// status-changing transition.
    pub fn terminal_status(&self) -> Option<JobStatus> {
        match self {
            Event::JobCompleted { .. } => Some(JobStatus::Completed),
            Event::JobFailed { .. } => Some(JobStatus::Failed),
            Event::JobCancelled { .. } => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
