// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DTOs shared by the Control API and Log API responses.

use base64::Engine;
use oj_core::{ChildStats, Job, JobId, JobStatus, OjError, StepRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat job view returned by `ListJobs`/`GetJob`, enriched with child
/// stats when the job is a parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    pub id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<JobId>,
    #[serde(rename = "type")]
    pub job_type: String,
    pub name: String,
    pub status: JobStatus,
    pub phase: String,
    pub progress_current: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_total: Option<u64>,
    pub created_at_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_stats: Option<ChildStats>,
}

impl JobSummary {
    pub fn from_job(job: &Job, child_stats: Option<ChildStats>) -> Self {
        Self {
            id: job.id,
            parent_id: job.parent_id,
            job_type: job.job_type.clone(),
            name: job.name.clone(),
            status: job.status,
            phase: job.phase.clone(),
            progress_current: job.progress_current,
            progress_total: job.progress_total,
            created_at_epoch_ms: job.created_at_epoch_ms,
            started_at_epoch_ms: job.started_at_epoch_ms,
            finished_at_epoch_ms: job.finished_at_epoch_ms,
            error: job.error.clone(),
            child_stats,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepRecordDetail {
    pub step_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub status: JobStatus,
    pub started_at_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_epoch_ms: Option<u64>,
}

impl From<&StepRecord> for StepRecordDetail {
    fn from(r: &StepRecord) -> Self {
        Self {
            step_name: r.step_name.clone(),
            step_id: r.step_id.clone(),
            status: r.status,
            started_at_epoch_ms: r.started_at_epoch_ms,
            finished_at_epoch_ms: r.finished_at_epoch_ms,
        }
    }
}

/// Full job view for `GET /jobs/{id}`: the summary plus the opaque
/// payload/config/metadata blobs and the step history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDetail {
    #[serde(flatten)]
    pub summary: JobSummary,
    pub payload: Value,
    pub config: Value,
    #[serde(default)]
    pub metadata: oj_core::OpenMap,
    #[serde(default)]
    pub steps: Vec<StepRecordDetail>,
}

impl JobDetail {
    pub fn from_job(job: &Job, child_stats: Option<ChildStats>) -> Self {
        Self {
            summary: JobSummary::from_job(job, child_stats),
            payload: job.payload.clone(),
            config: job.config.clone(),
            metadata: job.metadata.clone(),
            steps: job.steps.iter().map(StepRecordDetail::from).collect(),
        }
    }
}

/// A `{parent, children}` group for `GET /jobs?grouped=true`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobGroup {
    pub parent: JobSummary,
    pub children: Vec<JobSummary>,
}

/// One step's logs within a step-grouped `GET /logs?step=...` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepLogGroup {
    pub step_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub status: JobStatus,
    pub logs: Vec<oj_core::LogEntry>,
    pub total_count: usize,
    pub unfiltered_count: usize,
}

/// Opaque cursor for aggregated log pagination: the per-job merge
/// frontier at the point the previous page stopped. Self-describing —
/// no server-side state is required to resume (§6 cursor format).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// (job_id, line_number) of the next entry to emit for that job, in
    /// no particular order.
    pub frontier: Vec<(JobId, u64)>,
}

impl Cursor {
    pub fn encode(&self) -> Result<String, OjError> {
        let json = serde_json::to_vec(self).map_err(|e| OjError::validation(format!("cursor encode failed: {e}")))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(token: &str) -> Result<Self, OjError> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| OjError::validation(format!("invalid cursor: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| OjError::validation(format!("invalid cursor: {e}")))
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
