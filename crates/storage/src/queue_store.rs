// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue Store (§4.2): durable CRUD over jobs, event-sourced on top of
//! the WAL + `MaterializedState`.
//!
//! All reads take the state lock once and clone what they return, so
//! `ListJobs` never observes a torn write — the "snapshot-consistent"
//! requirement from §5.

use crate::{MaterializedState, Wal, WalError};
use oj_core::{ChildStats, Clock, Event, Job, JobId, JobStatus, ListJobsOptions, OjError};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;

/// Durable store of job records, wired to a WAL for crash recovery.
pub struct QueueStore<C: Clock> {
    state: Arc<RwLock<MaterializedState>>,
    wal: Arc<Mutex<Wal>>,
    clock: C,
}

impl<C: Clock> QueueStore<C> {
    pub fn open(wal_path: PathBuf, clock: C) -> Result<Self, WalError> {
        let wal = Wal::open(&wal_path, 0)?;
        let mut state = MaterializedState::default();
        for entry in wal.entries_after(0)? {
            state.apply_event(&entry.event);
        }
        Ok(Self { state: Arc::new(RwLock::new(state)), wal: Arc::new(Mutex::new(wal)), clock })
    }

    /// Construct directly from already-replayed state and an open WAL.
    /// Used by the daemon after a snapshot-then-replay recovery.
    pub fn from_parts(state: MaterializedState, wal: Wal, clock: C) -> Self {
        Self { state: Arc::new(RwLock::new(state)), wal: Arc::new(Mutex::new(wal)), clock }
    }

    pub fn state(&self) -> Arc<RwLock<MaterializedState>> {
        Arc::clone(&self.state)
    }

    fn commit(&self, event: Event) -> Result<(), OjError> {
        {
            let mut wal = self.wal.lock();
            wal.append(&event).map_err(|e| OjError::Io(io_err(e)))?;
            wal.flush().map_err(|e| OjError::Io(io_err(e)))?;
        }
        self.state.write().apply_event(&event);
        Ok(())
    }

    pub fn create_job(&self, job: Job) -> Result<(), OjError> {
        if let Some(parent_id) = &job.parent_id {
            let state = self.state.read();
            if state.get_job(parent_id).is_none() {
                return Err(OjError::validation(format!("parent job {parent_id} does not exist")));
            }
        }
        self.commit(Event::JobCreated { job })
    }

    pub fn get_job(&self, id: &JobId) -> Option<Job> {
        self.state.read().get_job(id).cloned()
    }

    /// Guarded status transition. Rejects non-terminal -> terminal
    /// reversal per the Job invariant (enforced in `Job::transition`,
    /// surfaced here as `OjError::Invariant`).
    pub fn transition_job(&self, id: &JobId, new_status: JobStatus) -> Result<(), OjError> {
        let epoch_ms = self.clock.epoch_ms();
        {
            let state = self.state.read();
            let job = state.get_job(id).ok_or_else(|| OjError::not_found(format!("job {id}")))?;
            let mut probe = job.clone();
            probe.transition(new_status, epoch_ms)?;
        }
        let event = match new_status {
            JobStatus::Running => Event::JobStarted { job_id: id.clone(), epoch_ms },
            JobStatus::Completed => Event::JobCompleted { job_id: id.clone(), epoch_ms },
            JobStatus::Cancelled => Event::JobCancelled { job_id: id.clone(), epoch_ms },
            JobStatus::Failed => Event::JobFailed { job_id: id.clone(), error: String::new(), epoch_ms },
            JobStatus::Pending => return Ok(()),
        };
        self.commit(event)
    }

    pub fn fail_job(&self, id: &JobId, error: impl Into<String>) -> Result<(), OjError> {
        let epoch_ms = self.clock.epoch_ms();
        {
            let state = self.state.read();
            let job = state.get_job(id).ok_or_else(|| OjError::not_found(format!("job {id}")))?;
            if job.is_terminal() {
                return Ok(());
            }
        }
        self.commit(Event::JobFailed { job_id: id.clone(), error: error.into(), epoch_ms })
    }

    pub fn update_progress(&self, id: &JobId, current: u64, total: Option<u64>) -> Result<(), OjError> {
        self.commit(Event::JobProgress { job_id: id.clone(), progress_current: current, progress_total: total })
    }

    pub fn update_metadata(&self, id: &JobId, metadata: oj_core::OpenMap) -> Result<(), OjError> {
        self.commit(Event::JobMetadataUpdated { job_id: id.clone(), metadata })
    }

    pub fn start_step(&self, id: &JobId, step_name: impl Into<String>, step_id: Option<String>) -> Result<(), OjError> {
        self.commit(Event::StepStarted { job_id: id.clone(), step_name: step_name.into(), step_id, epoch_ms: self.clock.epoch_ms() })
    }

    pub fn complete_step(&self, id: &JobId, step_name: impl Into<String>) -> Result<(), OjError> {
        self.commit(Event::StepCompleted { job_id: id.clone(), step_name: step_name.into(), epoch_ms: self.clock.epoch_ms() })
    }

    pub fn fail_step(&self, id: &JobId, step_name: impl Into<String>, error: impl Into<String>) -> Result<(), OjError> {
        self.commit(Event::StepFailed { job_id: id.clone(), step_name: step_name.into(), error: error.into(), epoch_ms: self.clock.epoch_ms() })
    }

    /// Delete `id`. Refuses if any non-terminal descendant exists — the
    /// Job Manager (§4.7) is responsible for cancelling first. Returns
    /// the number of jobs removed (including `id` itself).
    pub fn delete_job(&self, id: &JobId) -> Result<u64, OjError> {
        let descendants = {
            let state = self.state.read();
            if state.get_job(id).is_none() {
                return Err(OjError::not_found(format!("job {id}")));
            }
            let descendants = state.descendants_of(id);
            for d in &descendants {
                if let Some(job) = state.get_job(d) {
                    if !job.is_terminal() {
                        return Err(OjError::precondition(format!("descendant job {d} is not terminal")));
                    }
                }
            }
            descendants
        };
        let cascade_count = descendants.len() as u64 + 1;
        self.commit(Event::JobDeleted { job_id: id.clone(), cascade_count })?;
        Ok(cascade_count)
    }

    pub fn list_jobs(&self, opts: &ListJobsOptions) -> Vec<Job> {
        self.state.read().list_jobs(opts).into_iter().cloned().collect()
    }

    pub fn count_jobs(&self, opts: &ListJobsOptions) -> usize {
        self.state.read().count_jobs(opts)
    }

    pub fn jobs_by_status(&self, status: JobStatus) -> Vec<Job> {
        self.state.read().jobs_by_status(status).into_iter().cloned().collect()
    }

    pub fn job_children(&self, parent_id: &JobId) -> Vec<Job> {
        let state = self.state.read();
        state.children_of(parent_id).iter().filter_map(|id| state.get_job(id).cloned()).collect()
    }

    pub fn child_stats(&self, parent_id: &JobId) -> ChildStats {
        self.state.read().child_stats(parent_id)
    }

    pub fn descendants_of(&self, id: &JobId) -> Vec<JobId> {
        self.state.read().descendants_of(id)
    }
}

fn io_err(e: WalError) -> std::io::Error {
    match e {
        WalError::Io(e) => e,
        WalError::Json(e) => std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    }
}

#[cfg(test)]
#[path = "queue_store_tests.rs"]
mod tests;
