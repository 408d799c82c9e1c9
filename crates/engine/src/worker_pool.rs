// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Pool (spec §4.4): dispatches pending jobs to type-specific
//! executors with bounded parallelism.
//!
//! The dispatch loop itself is single-threaded (one `run` task), so
//! claiming a pending job — read status, then transition it to running
//! — never races against a second claimer; only the executor work that
//! follows a claim runs concurrently, bounded by a `Semaphore`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oj_core::{Clock, Event, Job, JobId, JobStatus, OjError};
use oj_storage::QueueStore;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::event_bus::EventBus;
use crate::RuntimeError;

/// Type-specific work performed once the Worker Pool transitions a job
/// to `running`. The concrete executors for real job types (fetching a
/// seed URL, running an agent classification) are external
/// collaborators per the spec's own non-goals; this crate supplies the
/// scheduling primitive they plug into.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job, cancel: CancellationToken) -> Result<(), RuntimeError>;
}

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct WorkerPool<C: Clock> {
    queue: Arc<QueueStore<C>>,
    events: Arc<EventBus>,
    clock: C,
    executors: HashMap<String, Arc<dyn JobExecutor>>,
    concurrency: usize,
    poll_interval: Duration,
    cancellations: Mutex<HashMap<JobId, CancellationToken>>,
}

impl<C: Clock + 'static> WorkerPool<C> {
    pub fn new(queue: Arc<QueueStore<C>>, events: Arc<EventBus>, clock: C) -> Self {
        Self {
            queue,
            events,
            clock,
            executors: HashMap::new(),
            concurrency: DEFAULT_CONCURRENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancellations: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn register_executor(mut self, job_type: impl Into<String>, executor: Arc<dyn JobExecutor>) -> Self {
        self.executors.insert(job_type.into(), executor);
        self
    }

    /// Request cooperative cancellation of a currently-running job.
    /// A no-op if the job isn't currently claimed by this pool.
    pub fn cancel(&self, job_id: &JobId) {
        if let Some(token) = self.cancellations.lock().get(job_id) {
            token.cancel();
        }
    }

    /// Run the poll-claim-dispatch loop until `shutdown` fires,
    /// draining in-flight work before returning.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            for job in self.queue.jobs_by_status(JobStatus::Pending) {
                let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else { continue };
                if !self.claim(&job.id) {
                    continue;
                }

                let token = CancellationToken::new();
                self.cancellations.lock().insert(job.id, token.clone());
                let pool = Arc::clone(&self);
                tasks.spawn(async move {
                    let _permit = permit;
                    pool.run_one(job, token).await;
                });
            }

            while tasks.try_join_next().is_some() {}
        }

        while tasks.join_next().await.is_some() {}
    }

    /// CAS-style claim: re-verify the job is still pending, then
    /// transition it to running. Safe without a separate lock because
    /// the dispatch loop that calls this is itself single-threaded.
    fn claim(&self, job_id: &JobId) -> bool {
        if self.queue.get_job(job_id).map(|j| j.status) != Some(JobStatus::Pending) {
            return false;
        }
        if self.queue.transition_job(job_id, JobStatus::Running).is_err() {
            return false;
        }
        self.events.publish(Event::JobStarted { job_id: *job_id, epoch_ms: self.clock.epoch_ms() });
        true
    }

    async fn run_one(&self, job: Job, cancel: CancellationToken) {
        let job_id = job.id;
        let result = match self.executors.get(&job.job_type) {
            Some(executor) => executor.execute(&job, cancel.clone()).await,
            None => Err(RuntimeError::Core(OjError::validation(format!(
                "no executor registered for job type {:?}",
                job.job_type
            )))),
        };
        self.finish(job_id, result, &cancel);
        self.cancellations.lock().remove(&job_id);
    }

    fn finish(&self, job_id: JobId, result: Result<(), RuntimeError>, cancel: &CancellationToken) {
        let epoch_ms = self.clock.epoch_ms();
        match result {
            Ok(()) => {
                if self.queue.transition_job(&job_id, JobStatus::Completed).is_ok() {
                    self.events.publish(Event::JobCompleted { job_id, epoch_ms });
                }
            }
            Err(err) if cancel.is_cancelled() => {
                if self.queue.transition_job(&job_id, JobStatus::Cancelled).is_ok() {
                    self.events.publish(Event::JobCancelled { job_id, epoch_ms });
                }
                warn!(%job_id, %err, "job cancelled");
            }
            Err(err) => {
                let message = err.to_string();
                if self.queue.fail_job(&job_id, message.clone()).is_ok() {
                    self.events.publish(Event::JobFailed { job_id, error: message, epoch_ms });
                }
                error!(%job_id, %err, "job failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
