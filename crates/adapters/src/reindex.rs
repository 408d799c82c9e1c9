// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous manager for the `reindex` action: search-index rebuild
//! (spec §4.5's "index rebuild" worked example). The search indexing
//! engine itself is an external collaborator (spec §1 non-goals); this
//! manager shells out to whatever indexer binary the step's config
//! names and records the result inline.

use async_trait::async_trait;
use oj_core::{JobId, JobStatus, LogLevel};
use oj_runbook::Step;
use oj_shell::{run_command, CommandSpec};
use tokio_util::sync::CancellationToken;

use crate::{AdapterError, JobHandle, StepManager};

#[derive(Debug, Default)]
pub struct ReindexManager;

#[async_trait]
impl StepManager for ReindexManager {
    fn manager_type(&self) -> &'static str {
        "reindex"
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
            .unwrap_or("true")
            .to_string();
        let args: Vec<String> = step
            .config
            .get("args")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let step_job = jobs.create_step_job(parent_job_id, "reindex", &step.name, step.config.clone()).await?;
        jobs.set_status(&step_job, JobStatus::Running, None).await?;
        jobs.append_log(&step_job, LogLevel::Info, "rebuilding search index").await?;

        let spec = CommandSpec::new(program).args(args);
        let result = run_command(&spec, cancel, |_line, _is_stderr| {})
            .await
            .map_err(|source| AdapterError::Shell { step: step.name.clone(), source })?;

        if result.success() {
            jobs.append_log(&step_job, LogLevel::Info, "index rebuild completed").await?;
            jobs.set_status(&step_job, JobStatus::Completed, None).await?;
            Ok(step_job)
        } else {
            let reason = format!("reindex command exited with {:?}", result.exit_code);
            jobs.set_status(&step_job, JobStatus::Failed, Some(reason.clone())).await?;
            Err(AdapterError::InvalidConfig { action: "reindex", reason })
        }
    }
}

#[cfg(test)]
#[path = "reindex_tests.rs"]
mod tests;
