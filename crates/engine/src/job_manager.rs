// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Manager (spec §4.7): the public façade over the Queue Store and
//! Log Store, enforcing the cascade-delete/cascade-cancel invariants.
//! Also implements `oj_adapters::JobHandle` so Step Managers can create
//! child jobs and report status without `oj-adapters` depending on this
//! crate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oj_adapters::JobHandle;
use oj_core::{
    ChildStats, Clock, Event, Job, JobConfig, JobId, JobStatus, ListJobsOptions, LogEntry, LogLevel,
    OjError, OpenMap,
};
use oj_storage::{LogStore, QueueStore};
use serde_json::Value;

use crate::event_bus::EventBus;
use crate::RuntimeError;

/// Façade combining the Queue Store, Log Store and Event Bus (spec
/// §4.7).
pub struct JobManager<C: Clock> {
    queue: Arc<QueueStore<C>>,
    logs: Arc<LogStore>,
    events: Arc<EventBus>,
    clock: C,
}

impl<C: Clock> JobManager<C> {
    pub fn new(queue: Arc<QueueStore<C>>, logs: Arc<LogStore>, events: Arc<EventBus>, clock: C) -> Self {
        Self { queue, logs, events, clock }
    }

    pub fn queue(&self) -> &Arc<QueueStore<C>> {
        &self.queue
    }

    pub fn logs(&self) -> &Arc<LogStore> {
        &self.logs
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// `CreateJob` (spec §4.7): a root job, with no parent.
    pub fn create_job(
        &self,
        job_type: impl Into<String>,
        name: impl Into<String>,
        payload: Value,
        config: Value,
        progress_total: Option<u64>,
    ) -> Result<JobId, RuntimeError> {
        let mut builder = JobConfig::builder(job_type, name).payload(payload).config(config);
        if let Some(total) = progress_total {
            builder = builder.progress_total(total);
        }
        let job = Job::new(builder.build(), &self.clock);
        let id = job.id;
        self.queue.create_job(job.clone())?;
        self.events.publish(Event::JobCreated { job });
        Ok(id)
    }

    pub fn get_job(&self, id: &JobId) -> Option<Job> {
        self.queue.get_job(id)
    }

    pub fn list_jobs(&self, opts: &ListJobsOptions) -> Vec<Job> {
        self.queue.list_jobs(opts)
    }

    pub fn count_jobs(&self, opts: &ListJobsOptions) -> usize {
        self.queue.count_jobs(opts)
    }

    pub fn update_progress(&self, id: &JobId, current: u64, total: Option<u64>) -> Result<(), RuntimeError> {
        self.queue.update_progress(id, current, total)?;
        Ok(())
    }

    pub fn update_metadata(&self, id: &JobId, metadata: OpenMap) -> Result<(), RuntimeError> {
        self.queue.update_metadata(id, metadata)?;
        Ok(())
    }

    /// `GetJobChildStats` (spec §4.7): batched per-parent child status
    /// counts, each from a single consistent read.
    pub fn job_child_stats(&self, parent_ids: &[JobId]) -> HashMap<JobId, ChildStats> {
        parent_ids.iter().map(|id| (*id, self.queue.child_stats(id))).collect()
    }

    /// `StopAllChildJobs` (spec §4.7): cancel every non-terminal
    /// descendant of `parent_id`, returning the count affected.
    pub fn stop_all_child_jobs(&self, parent_id: &JobId) -> Result<u64, RuntimeError> {
        let descendants = self.queue.descendants_of(parent_id);
        let mut count = 0u64;
        for descendant in &descendants {
            let Some(job) = self.queue.get_job(descendant) else { continue };
            if job.is_terminal() {
                continue;
            }
            self.queue.transition_job(descendant, JobStatus::Cancelled)?;
            self.events.publish(Event::JobCancelled { job_id: *descendant, epoch_ms: self.clock.epoch_ms() });
            count += 1;
        }
        Ok(count)
    }

    /// `DeleteJob` (spec §4.7): for a running orchestrating ("parent"
    /// type) job, cancels children then the parent before deleting; for
    /// any other non-terminal job, refuses. The Queue Store itself
    /// refuses to delete a job with non-terminal descendants, so the
    /// cascade-cancel above is what makes a running parent deletable.
    pub fn delete_job(&self, id: &JobId) -> Result<u64, RuntimeError> {
        let job = self.queue.get_job(id).ok_or_else(|| OjError::not_found(format!("job {id}")))?;
        if !job.is_terminal() {
            if job.is_parent_type() {
                self.stop_all_child_jobs(id)?;
                self.queue.transition_job(id, JobStatus::Cancelled)?;
                self.events.publish(Event::JobCancelled { job_id: *id, epoch_ms: self.clock.epoch_ms() });
            } else {
                return Err(RuntimeError::Core(OjError::precondition(format!(
                    "job {id} is not terminal; cancel it before deleting"
                ))));
            }
        }

        let mut affected = self.queue.descendants_of(id);
        affected.push(*id);
        let cascade_count = self.queue.delete_job(id)?;
        for affected_id in &affected {
            let _ = self.logs.delete_logs(affected_id);
        }
        self.events.publish(Event::JobDeleted { job_id: *id, cascade_count });
        Ok(cascade_count)
    }

    fn log_entry(&self, job: &Job, level: LogLevel, message: &str) -> LogEntry {
        let epoch_ms = self.clock.epoch_ms();
        let (timestamp, full_timestamp) = format_timestamps(epoch_ms);
        let step = job.steps.last();
        LogEntry {
            job_id: job.id,
            line_number: 0,
            level,
            timestamp,
            full_timestamp,
            message: message.to_string(),
            step_name: step.map(|s| s.step_name.clone()),
            step_id: step.and_then(|s| s.step_id.clone()),
            source_type: job.job_type.clone(),
            originator: "system".to_string(),
            phase: job.phase.clone(),
        }
    }
}

/// UI-friendly `HH:MM:SS` rendering alongside the full RFC 3339
/// timestamp, both derived from the same epoch-ms value so they never
/// disagree.
fn format_timestamps(epoch_ms: u64) -> (String, String) {
    let dt = DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64).unwrap_or_else(Utc::now);
    (dt.format("%H:%M:%S").to_string(), dt.to_rfc3339())
}

#[async_trait]
impl<C: Clock + 'static> JobHandle for JobManager<C> {
    async fn create_child_job(
        &self,
        parent_id: JobId,
        job_type: &str,
        name: &str,
        config: Value,
    ) -> Result<JobId, OjError> {
        let job = Job::new(JobConfig::builder(job_type, name).parent_id(parent_id).config(config).build(), &self.clock);
        let id = job.id;
        self.queue.create_job(job.clone())?;
        self.events.publish(Event::JobCreated { job });
        Ok(id)
    }

    async fn get_job_status(&self, id: &JobId) -> Result<JobStatus, OjError> {
        self.queue.get_job(id).map(|job| job.status).ok_or_else(|| OjError::not_found(format!("job {id}")))
    }

    async fn set_status(&self, id: &JobId, status: JobStatus, error: Option<String>) -> Result<(), OjError> {
        let epoch_ms = self.clock.epoch_ms();
        let event = match status {
            JobStatus::Pending => return Ok(()),
            JobStatus::Running => {
                self.queue.transition_job(id, JobStatus::Running)?;
                Event::JobStarted { job_id: *id, epoch_ms }
            }
            JobStatus::Completed => {
                self.queue.transition_job(id, JobStatus::Completed)?;
                Event::JobCompleted { job_id: *id, epoch_ms }
            }
            JobStatus::Cancelled => {
                self.queue.transition_job(id, JobStatus::Cancelled)?;
                Event::JobCancelled { job_id: *id, epoch_ms }
            }
            JobStatus::Failed => {
                let message = error.unwrap_or_default();
                self.queue.fail_job(id, message.clone())?;
                Event::JobFailed { job_id: *id, error: message, epoch_ms }
            }
        };
        self.events.publish(event);
        Ok(())
    }

    async fn create_step_job(
        &self,
        parent_id: JobId,
        job_type: &str,
        name: &str,
        config: Value,
    ) -> Result<JobId, OjError> {
        self.create_child_job(parent_id, job_type, name, config).await
    }

    async fn append_log(&self, job_id: &JobId, level: LogLevel, message: &str) -> Result<(), OjError> {
        let job = self.queue.get_job(job_id).ok_or_else(|| OjError::not_found(format!("job {job_id}")))?;
        let entry = self.log_entry(&job, level, message);
        let stored = self
            .logs
            .append(entry)
            .map_err(|e| OjError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        self.events.publish(Event::LogAppended { entry: stored });
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_manager_tests.rs"]
mod tests;
