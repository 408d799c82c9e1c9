// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use oj_core::{JobId, JobStatus, LogLevel, OjError};
use serde_json::Value;

/// The slice of the Job Manager (`oj-engine`) a Step Manager needs:
/// create a child job, enqueue it, and observe its terminal status.
/// Kept as a trait here (rather than a concrete type) so `oj-adapters`
/// has no dependency on `oj-engine`, which in turn depends on
/// `oj-adapters` for dispatch.
#[async_trait]
pub trait JobHandle: Send + Sync {
    /// `JobManager::CreateChildJob` (spec §4.7): create a pending child
    /// job under `parent_id` and enqueue it for the Worker Pool to pick
    /// up. Returns the new job's id.
    async fn create_child_job(
        &self,
        parent_id: JobId,
        job_type: &str,
        name: &str,
        config: Value,
    ) -> Result<JobId, OjError>;

    /// Current status of `id`, for fan-out polling.
    async fn get_job_status(&self, id: &JobId) -> Result<JobStatus, OjError>;

    /// Transition `id` to `status`("running"/"completed"/"failed"),
    /// recording `error` when failing. Used by synchronous managers that
    /// own their step's own job record directly rather than through the
    /// Worker Pool.
    async fn set_status(&self, id: &JobId, status: JobStatus, error: Option<String>) -> Result<(), OjError>;

    /// Create a job record representing this step's own execution
    /// (distinct from any children it fans out to), in `pending` status.
    async fn create_step_job(
        &self,
        parent_id: JobId,
        job_type: &str,
        name: &str,
        config: Value,
    ) -> Result<JobId, OjError>;

    /// Append a structured log line to `job_id`'s stream. Synchronous
    /// managers use this to record their own progress directly, rather
    /// than through a Worker Pool executor.
    async fn append_log(&self, job_id: &JobId, level: LogLevel, message: &str) -> Result<(), OjError>;
}
