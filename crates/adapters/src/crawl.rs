// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out manager for the `crawl` action: one child job per seed URL
//! (spec §4.5's worked example). The actual HTTP fetch/scrape protocol
//! is an external collaborator (spec §1 non-goals); this manager's job
//! is the fan-out/poll/aggregate shape, not the crawler itself.

use async_trait::async_trait;
use oj_core::{JobId, JobStatus};
use oj_runbook::Step;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::{fanout, AdapterError, JobHandle, StepManager, DEFAULT_FANOUT_POLL_INTERVAL, DEFAULT_FANOUT_TIMEOUT};

#[derive(Debug, Default)]
pub struct CrawlManager;

#[async_trait]
impl StepManager for CrawlManager {
    fn manager_type(&self) -> &'static str {
        "crawl"
    }

    fn returns_child_jobs(&self) -> bool {
        true
    }

    async fn create_parent_job(
        &self,
        step: &Step,
        parent_job_id: JobId,
        jobs: &dyn JobHandle,
        cancel: CancellationToken,
    ) -> Result<JobId, AdapterError> {
        let seed_urls = step
            .config
            .get("seed_urls")
            .and_then(|v| v.as_array())
            .ok_or_else(|| AdapterError::InvalidConfig {
                action: "crawl",
                reason: "missing or non-array \"seed_urls\"".to_string(),
            })?;
        let max_depth = step.config.get("max_depth").cloned().unwrap_or(json!(0));

        let step_job = jobs.create_step_job(parent_job_id, "crawl", &step.name, step.config.clone()).await?;
        jobs.set_status(&step_job, JobStatus::Running, None).await?;
        jobs.append_log(&step_job, oj_core::LogLevel::Info, &format!("discovering {} seed url(s)", seed_urls.len()))
            .await?;

        let mut children = Vec::with_capacity(seed_urls.len());
        for url in seed_urls {
            let Some(url) = url.as_str() else {
                return Err(AdapterError::InvalidConfig {
                    action: "crawl",
                    reason: "seed_urls entries must be strings".to_string(),
                });
            };
            let child_config = json!({ "url": url, "max_depth": max_depth });
            let child = jobs.create_child_job(step_job, "crawl_url", &format!("crawl {url}"), child_config).await?;
            children.push(child);
        }

        match fanout::wait_for_children(
            &step.name,
            &children,
            jobs,
            &cancel,
            DEFAULT_FANOUT_TIMEOUT,
            DEFAULT_FANOUT_POLL_INTERVAL,
        )
        .await
        {
            Ok(()) => {
                jobs.set_status(&step_job, JobStatus::Completed, None).await?;
                Ok(step_job)
            }
            Err(err) => {
                jobs.set_status(&step_job, JobStatus::Failed, Some(err.to_string())).await?;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "crawl_tests.rs"]
mod tests;
