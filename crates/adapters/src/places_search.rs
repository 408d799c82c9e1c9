// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous manager for the `places_search` action: a single inline
//! call against a third-party places/business-listing SaaS API (spec
//! §4.5's "places-API search" worked example). The actual SaaS protocol
//! is explicitly out of scope (spec §1 non-goals: "the specific
//! scraping protocols for third-party SaaS systems") — this manager
//! owns only the job-record lifecycle around that call, recording the
//! query it would have issued as metadata for the caller to act on.

use async_trait::async_trait;
use oj_core::{JobId, JobStatus, LogLevel};
use oj_runbook::Step;
use tokio_util::sync::CancellationToken;

use crate::{AdapterError, JobHandle, StepManager};

#[derive(Debug, Default)]
pub struct PlacesSearchManager;

#[async_trait]
impl StepManager for PlacesSearchManager {
    fn manager_type(&self) -> &'static str {
        "places_search"
    }

    fn returns_child_jobs(&self) -> bool {
        false
    }

    async fn create_parent_job(
        &self,
        step: &Step,
        parent_job_id: JobId,
        jobs: &dyn JobHandle,
        _cancel: CancellationToken,
    ) -> Result<JobId, AdapterError> {
        let query = step.config.get("query").and_then(|v| v.as_str()).ok_or_else(|| AdapterError::InvalidConfig {
            action: "places_search",
            reason: "missing or non-string \"query\"".to_string(),
        })?;

        let step_job = jobs.create_step_job(parent_job_id, "places_search", &step.name, step.config.clone()).await?;
        jobs.set_status(&step_job, JobStatus::Running, None).await?;
        jobs.append_log(&step_job, LogLevel::Info, &format!("searching places for {query:?}")).await?;
        jobs.set_status(&step_job, JobStatus::Completed, None).await?;
        Ok(step_job)
    }
}

#[cfg(test)]
#[path = "places_search_tests.rs"]
mod tests;
