// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous manager for the `transform` action: HTML-to-markdown (or
//! similar) document transformation run inline via `oj-shell` (spec
//! §4.5's "HTML→markdown transform" worked example). Runs to completion
//! before returning; never fans out to children.

use async_trait::async_trait;
use oj_core::{JobId, JobStatus, LogLevel};
use oj_runbook::Step;
use oj_shell::{run_command, CommandSpec};
use tokio_util::sync::CancellationToken;

use crate::{AdapterError, JobHandle, StepManager};

#[derive(Debug, Default)]
pub struct TransformManager;

#[async_trait]
impl StepManager for TransformManager {
    fn manager_type(&self) -> &'static str {
        "transform"
    }

    fn returns_child_jobs(&self) -> bool {
        false
    }

    async fn create_parent_job(
        &self,
        step: &Step,
        parent_job_id: JobId,
        jobs: &dyn JobHandle,
        cancel: CancellationToken,
    ) -> Result<JobId, AdapterError> {
        let program = step
            .config
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::InvalidConfig {
                action: "transform",
                reason: "missing or non-string \"command\"".to_string(),
            })?
            .to_string();
        let args: Vec<String> = step
            .config
            .get("args")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let step_job = jobs.create_step_job(parent_job_id, "transform", &step.name, step.config.clone()).await?;
        jobs.set_status(&step_job, JobStatus::Running, None).await?;

        let spec = CommandSpec::new(program).args(args);
        let result = run_command(&spec, cancel, |_line, _is_stderr| {})
            .await
            .map_err(|source| AdapterError::Shell { step: step.name.clone(), source })?;

        if result.success() {
            jobs.append_log(&step_job, LogLevel::Info, "transform completed").await?;
            jobs.set_status(&step_job, JobStatus::Completed, None).await?;
            Ok(step_job)
        } else {
            let reason = if result.timed_out {
                "transform command timed out".to_string()
            } else if result.cancelled {
                "transform command cancelled".to_string()
            } else {
                format!("transform command exited with {:?}", result.exit_code)
            };
            jobs.set_status(&step_job, JobStatus::Failed, Some(reason.clone())).await?;
            Err(AdapterError::InvalidConfig { action: "transform", reason })
        }
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
