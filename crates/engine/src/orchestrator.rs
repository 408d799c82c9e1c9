// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step Orchestrator (spec §4.6): walks a job definition's ordered
//! steps, invoking the matching Step Manager for each, against one
//! parent job record for the whole run.

use std::sync::Arc;

use oj_adapters::{AdapterError, JobHandle, StepManagerRegistry};
use oj_core::{Clock, JobId, JobStatus, LogLevel, OjError};
use oj_runbook::JobDefinition;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::job_manager::JobManager;
use crate::RuntimeError;

/// A workflow's progress through its step list (spec §4.6: "created →
/// running(step_i) → completed | failed | cancelled"). Derived from a
/// parent job's `status`/`steps` rather than tracked separately, so it
/// can never drift from the persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Created,
    Running { step_index: usize, step_name: String },
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowState {
    pub fn of(job: &oj_core::Job) -> Self {
        match job.status {
            JobStatus::Pending => WorkflowState::Created,
            JobStatus::Completed => WorkflowState::Completed,
            JobStatus::Failed => WorkflowState::Failed,
            JobStatus::Cancelled => WorkflowState::Cancelled,
            JobStatus::Running => match job.steps.last() {
                Some(step) => WorkflowState::Running { step_index: job.steps.len() - 1, step_name: step.step_name.clone() },
                None => WorkflowState::Created,
            },
        }
    }
}

/// Job type given to the workflow-level parent job a run creates. The
/// Job Manager's delete cascade (`Job::is_parent_type`) recognizes it so
/// a running workflow is cancelled-then-deleted rather than refused.
pub const WORKFLOW_JOB_TYPE: &str = "parent";

pub struct Orchestrator<C: Clock> {
    jobs: Arc<JobManager<C>>,
    registry: Arc<StepManagerRegistry>,
}

impl<C: Clock + 'static> Orchestrator<C> {
    pub fn new(jobs: Arc<JobManager<C>>, registry: Arc<StepManagerRegistry>) -> Self {
        Self { jobs, registry }
    }

    /// Run `definition` once as a new workflow instance, returning the
    /// parent job id immediately after the run reaches a terminal
    /// status (this call blocks for the run's whole duration, per
    /// spec §5: "the Orchestrator's per-workflow driver is a single
    /// logical thread that may block on polling child status").
    pub async fn run(
        &self,
        definition: &JobDefinition,
        payload: Value,
        cancel: CancellationToken,
    ) -> Result<JobId, RuntimeError> {
        let parent_id = self.jobs.create_job(
            definition.job_type.clone(),
            definition.name.clone(),
            payload,
            Value::Object(serde_json::Map::new()),
            None,
        )?;
        self.jobs.set_status(&parent_id, JobStatus::Running, None).await?;

        for step in &definition.steps {
            if cancel.is_cancelled() {
                self.cancel_workflow(&parent_id).await?;
                return Err(RuntimeError::Core(OjError::cancelled(format!(
                    "workflow {parent_id} cancelled before step \"{}\"",
                    step.name
                ))));
            }

            let action = step.action.as_str();
            let Some(manager) = self.registry.get(action) else {
                let message = format!("unknown step action \"{action}\"");
                self.jobs.queue().fail_step(&parent_id, step.name.clone(), message.clone()).ok();
                self.jobs.set_status(&parent_id, JobStatus::Failed, Some(message)).await?;
                return Err(RuntimeError::UnknownAction(action.to_string()));
            };

            self.jobs.queue().start_step(&parent_id, step.name.clone(), None)?;
            self.jobs
                .append_log(&parent_id, LogLevel::Info, &format!("starting step \"{}\"", step.name))
                .await?;

            match manager.create_parent_job(step, parent_id, self.jobs.as_ref(), cancel.clone()).await {
                Ok(_step_job_id) => {
                    self.jobs.queue().complete_step(&parent_id, step.name.clone())?;
                }
                Err(err) => {
                    let message = err.to_string();
                    self.jobs.queue().fail_step(&parent_id, step.name.clone(), message.clone()).ok();
                    if is_cancellation(&err) {
                        self.cancel_workflow(&parent_id).await?;
                    } else {
                        self.jobs.stop_all_child_jobs(&parent_id)?;
                        self.jobs.set_status(&parent_id, JobStatus::Failed, Some(message)).await?;
                    }
                    return Err(RuntimeError::Adapter(err));
                }
            }
        }

        self.jobs.set_status(&parent_id, JobStatus::Completed, None).await?;
        Ok(parent_id)
    }

    /// Cascade-cancel every non-terminal child of `parent_id`, then mark
    /// the parent itself cancelled (spec §4.6: "mark parent cancelled
    /// when the step's manager returns").
    async fn cancel_workflow(&self, parent_id: &JobId) -> Result<(), RuntimeError> {
        self.jobs.stop_all_child_jobs(parent_id)?;
        self.jobs.set_status(parent_id, JobStatus::Cancelled, None).await?;
        Ok(())
    }
}

fn is_cancellation(err: &AdapterError) -> bool {
    matches!(err, AdapterError::Core(OjError::Cancelled(_)))
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
