// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine — the sole execution entity tracked
//! by the core.

use crate::clock::Clock;
use crate::error::OjError;
use crate::log::OpenMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

crate::define_id! {
    /// Unique identifier for a job instance.
    ///
    /// Jobs form a forest via `parent_id`; a job with no parent is a
    /// workflow-level root (see the Orchestrator, §4.6).
    pub struct JobId("job-");
}

/// Lifecycle status of a job, and (reused) of a single step within a job
/// so the "step-grouped" log view can report real status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Record of a single step's execution within a job. Exists so the Log
/// API's step-grouped view (§6) can report a real `status` per step
/// rather than the source's hardcoded placeholder (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub status: JobStatus,
    pub started_at_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_epoch_ms: Option<u64>,
}

/// Configuration for creating a new job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub id: JobId,
    pub parent_id: Option<JobId>,
    pub job_type: String,
    pub name: String,
    pub phase: String,
    pub payload: Value,
    pub config: Value,
    pub metadata: OpenMap,
    pub progress_total: Option<u64>,
}

impl JobConfig {
    pub fn builder(job_type: impl Into<String>, name: impl Into<String>) -> JobConfigBuilder {
        JobConfigBuilder {
            id: JobId::new(),
            parent_id: None,
            job_type: job_type.into(),
            name: name.into(),
            phase: String::new(),
            payload: Value::Null,
            config: Value::Null,
            metadata: OpenMap::new(),
            progress_total: None,
        }
    }
}

pub struct JobConfigBuilder {
    id: JobId,
    parent_id: Option<JobId>,
    job_type: String,
    name: String,
    phase: String,
    payload: Value,
    config: Value,
    metadata: OpenMap,
    progress_total: Option<u64>,
}

impl JobConfigBuilder {
    crate::setters! {
        into {
            phase: String,
        }
        set {
            id: JobId,
            payload: Value,
            config: Value,
            metadata: OpenMap,
        }
        option {
            parent_id: JobId,
            progress_total: u64,
        }
    }

    pub fn build(self) -> JobConfig {
        JobConfig {
            id: self.id,
            parent_id: self.parent_id,
            job_type: self.job_type,
            name: self.name,
            phase: self.phase,
            payload: self.payload,
            config: self.config,
            metadata: self.metadata,
            progress_total: self.progress_total,
        }
    }
}

/// A job: the sole execution entity. See `spec` §3 for the full field
/// rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<JobId>,
    #[serde(rename = "type")]
    pub job_type: String,
    pub name: String,
    pub status: JobStatus,
    pub phase: String,
    pub payload: Value,
    pub config: Value,
    #[serde(default)]
    pub metadata: OpenMap,
    #[serde(default)]
    pub progress_current: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_total: Option<u64>,
    pub created_at_epoch_ms: u64,
    /// Mirrors the epoch-ms field as a monotonic `Instant` for
    /// in-process duration math; never serialized (reconstructed as
    /// "now" on WAL replay, which is fine since only the epoch-ms field
    /// is load-bearing for persisted durations).
    #[serde(skip, default = "Instant::now")]
    pub created_at: Instant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Monotonic counter for log line numbers. The Log Store is the
    /// authority for the *next* line number assigned (guarded by a
    /// per-job mutex there); this field mirrors the high-water mark for
    /// the universal invariant in §8.1.
    #[serde(default)]
    pub line_number_counter: u64,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

impl Job {
    pub fn new(config: JobConfig, clock: &impl Clock) -> Self {
        Self::new_with_epoch_ms(config, clock.epoch_ms())
    }

    /// Create a job with an explicit epoch_ms (for WAL replay, where
    /// events — not wall-clock — determine timestamps).
    pub fn new_with_epoch_ms(config: JobConfig, epoch_ms: u64) -> Self {
        Self {
            id: config.id,
            parent_id: config.parent_id,
            job_type: config.job_type,
            name: config.name,
            status: JobStatus::Pending,
            phase: config.phase,
            payload: config.payload,
            config: config.config,
            metadata: config.metadata,
            progress_current: 0,
            progress_total: config.progress_total,
            created_at_epoch_ms: epoch_ms,
            created_at: Instant::now(),
            started_at_epoch_ms: None,
            finished_at_epoch_ms: None,
            error: None,
            line_number_counter: 0,
            steps: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether this job is an orchestrating "parent" job (created by the
    /// Orchestrator for a whole workflow run) rather than a step-manager
    /// leaf/fan-out child. Used by the Job Manager's delete cascade
    /// (§4.7): parent-type jobs running children are cancelled before
    /// being deleted rather than refused outright.
    pub fn is_parent_type(&self) -> bool {
        self.job_type == "parent" || self.job_type == "workflow"
    }

    /// Guarded status transition. Enforces the invariant that a terminal
    /// job never re-enters a non-terminal status (§3). Re-applying the
    /// same terminal status is treated as a no-op success so cancellation
    /// and WAL replay stay idempotent.
    pub fn transition(&mut self, new_status: JobStatus, epoch_ms: u64) -> Result<(), OjError> {
        if self.status.is_terminal() {
            if self.status == new_status {
                return Ok(());
            }
            return Err(OjError::invariant(format!(
                "job {} is terminal ({}), cannot transition to {}",
                self.id, self.status, new_status
            )));
        }
        match new_status {
            JobStatus::Running => {
                self.started_at_epoch_ms.get_or_insert(epoch_ms);
            }
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                self.finished_at_epoch_ms = Some(epoch_ms);
            }
            JobStatus::Pending => {}
        }
        self.status = new_status;
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, epoch_ms: u64) -> Result<(), OjError> {
        self.error = Some(error.into());
        self.transition(JobStatus::Failed, epoch_ms)
    }

    /// Record progress, clamping `progress_current` within
    /// `[0, progress_total]` when a total is known.
    pub fn set_progress(&mut self, current: u64, total: Option<u64>) {
        self.progress_total = total.or(self.progress_total);
        self.progress_current = match self.progress_total {
            Some(t) => current.min(t),
            None => current,
        };
    }

    /// Allocate the next log line number for this job. Mirrors the
    /// authoritative counter kept by the Log Store; callers that own a
    /// `Job` directly (rather than going through the Log Store) use this
    /// to keep `line_number_counter` consistent with §8's invariant.
    pub fn next_line_number(&mut self) -> u64 {
        self.line_number_counter += 1;
        self.line_number_counter
    }

    pub fn start_step(&mut self, step_name: impl Into<String>, step_id: Option<String>, epoch_ms: u64) {
        self.phase = step_name.into();
        self.steps.push(StepRecord {
            step_name: self.phase.clone(),
            step_id,
            status: JobStatus::Running,
            started_at_epoch_ms: epoch_ms,
            finished_at_epoch_ms: None,
        });
    }

    /// Finalize the most recently started step record, if it hasn't
    /// already finished (idempotent under WAL replay).
    pub fn finish_step(&mut self, status: JobStatus, epoch_ms: u64) {
        if let Some(record) = self.steps.last_mut() {
            if record.finished_at_ms_is_none() {
                record.status = status;
                record.finished_at_epoch_ms = Some(epoch_ms);
            }
        }
    }
}

impl StepRecord {
    fn finished_at_ms_is_none(&self) -> bool {
        self.finished_at_epoch_ms.is_none()
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            job_type: String = "crawl",
            name: String = "test-job",
            phase: String = "",
        }
        set {
            id: JobId = JobId::from_string("job-test00000000000000"),
            status: JobStatus = JobStatus::Pending,
            payload: Value = Value::Null,
            config: Value = Value::Null,
            metadata: OpenMap = OpenMap::new(),
            progress_current: u64 = 0,
            line_number_counter: u64 = 0,
            steps: Vec<StepRecord> = Vec::new(),
            created_at_epoch_ms: u64 = 1_000_000,
        }
        option {
            parent_id: JobId = None,
            progress_total: u64 = None,
            started_at_epoch_ms: u64 = None,
            finished_at_epoch_ms: u64 = None,
            error: String = None,
        }
        computed {
            created_at: Instant = Instant::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
