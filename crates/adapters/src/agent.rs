// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out manager shared by the `agent`, `classify`, and `summarize`
//! actions: one child job per document (spec §4.5's other worked
//! example, "per-document agent classification"). The LLM/embedding
//! calls themselves are an external collaborator (spec §1 non-goals);
//! this manager owns the fan-out/poll shape only.

use async_trait::async_trait;
use oj_core::{JobId, JobStatus};
use oj_runbook::Step;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::{fanout, AdapterError, JobHandle, StepManager, DEFAULT_FANOUT_POLL_INTERVAL, DEFAULT_FANOUT_TIMEOUT};

#[derive(Debug, Default)]
pub struct AgentManager;

#[async_trait]
impl StepManager for AgentManager {
    fn manager_type(&self) -> &'static str {
        "agent"
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
        let document_ids = step
            .config
            .get("document_ids")
            .and_then(|v| v.as_array())
            .ok_or_else(|| AdapterError::InvalidConfig {
                action: step.action.as_str(),
                reason: "missing or non-array \"document_ids\"".to_string(),
            })?;
        let model = step.config.get("model").cloned().unwrap_or(json!(null));

        let step_job = jobs.create_step_job(parent_job_id, step.action.as_str(), &step.name, step.config.clone()).await?;
        jobs.set_status(&step_job, JobStatus::Running, None).await?;
        jobs.append_log(
            &step_job,
            oj_core::LogLevel::Info,
            &format!("dispatching {} document(s) to {}", document_ids.len(), step.action),
        )
        .await?;

        let mut children = Vec::with_capacity(document_ids.len());
        for document_id in document_ids {
            let child_config = json!({ "document_id": document_id, "model": model });
            let child = jobs
                .create_child_job(step_job, step.action.as_str(), &format!("{} {document_id}", step.action), child_config)
                .await?;
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
#[path = "agent_tests.rs"]
mod tests;
