// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived by folding `Event`s over the WAL.
//!
//! Holds the job forest (§3 Data Model) plus a derived children index
//! maintained incrementally so `GetJobChildren`/child-stats queries don't
//! need a linear scan. This is the single piece of mutable shared state
//! the Queue Store contract (§4.2) guards; callers always see it through
//! a `parking_lot::RwLock` held by `QueueStore` so `ListJobs` reads are
//! snapshot-consistent per §5.

use oj_core::{ChildStats, Event, Job, JobId, JobStatus, ListJobsOptions, OrderBy, OrderDir};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<JobId, Job>,
    /// parent_id -> child ids, in creation order.
    #[serde(default)]
    pub children: HashMap<JobId, Vec<JobId>>,
}

impl MaterializedState {
    pub fn get_job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn get_job_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    pub fn children_of(&self, parent_id: &JobId) -> &[JobId] {
        self.children.get(parent_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Transitive closure of descendants below `root`, not including
    /// `root` itself. BFS order (stable, not load-bearing).
    pub fn descendants_of(&self, root: &JobId) -> Vec<JobId> {
        let mut out = Vec::new();
        let mut frontier = self.children_of(root).to_vec();
        while let Some(id) = frontier.pop() {
            let grandchildren = self.children_of(&id).to_vec();
            out.push(id);
            frontier.extend(grandchildren);
        }
        out
    }

    /// `root` plus its full descendant subtree, per the Log Service's
    /// `include_children` resolution (§4.3 step 1).
    pub fn subtree_of(&self, root: &JobId) -> Vec<JobId> {
        let mut out = vec![root.clone()];
        out.extend(self.descendants_of(root));
        out
    }

    /// Depth of `job_id` below `root` (0 if equal), or `None` if
    /// `job_id` is not a descendant of `root`.
    pub fn depth_below(&self, root: &JobId, job_id: &JobId) -> Option<u32> {
        if root == job_id {
            return Some(0);
        }
        let mut depth = 1u32;
        let mut frontier = self.children_of(root).to_vec();
        while !frontier.is_empty() {
            if frontier.iter().any(|c| c == job_id) {
                return Some(depth);
            }
            let mut next = Vec::new();
            for c in &frontier {
                next.extend(self.children_of(c).iter().cloned());
            }
            frontier = next;
            depth += 1;
        }
        None
    }

    pub fn child_stats(&self, parent_id: &JobId) -> ChildStats {
        let mut stats = ChildStats::default();
        for child_id in self.children_of(parent_id) {
            let Some(child) = self.jobs.get(child_id) else { continue };
            stats.child_count += 1;
            match child.status {
                JobStatus::Pending => stats.pending_children += 1,
                JobStatus::Running => stats.running_children += 1,
                JobStatus::Completed => stats.completed_children += 1,
                JobStatus::Failed => stats.failed_children += 1,
                JobStatus::Cancelled => stats.cancelled_children += 1,
            }
        }
        stats
    }

    /// `ListJobs` (§4.2): filter, order, then paginate with
    /// `limit`/`offset`.
    pub fn list_jobs(&self, opts: &ListJobsOptions) -> Vec<&Job> {
        if opts.limit == 0 {
            return Vec::new();
        }
        let mut matching: Vec<&Job> = self.jobs.values().filter(|j| Self::matches(j, opts)).collect();
        Self::sort_jobs(&mut matching, opts.order_by, opts.order_dir);

        let start = opts.offset.min(matching.len());
        let end = matching.len().min(start.saturating_add(opts.limit));
        matching[start..end].to_vec()
    }

    pub fn count_jobs(&self, opts: &ListJobsOptions) -> usize {
        self.jobs.values().filter(|j| Self::matches(j, opts)).count()
    }

    pub fn jobs_by_status(&self, status: JobStatus) -> Vec<&Job> {
        self.jobs.values().filter(|j| j.status == status).collect()
    }

    fn matches(job: &Job, opts: &ListJobsOptions) -> bool {
        if !opts.matches_status(job.status) {
            return false;
        }
        if let Some(source_type) = &opts.source_type {
            if &job.job_type != source_type {
                return false;
            }
        }
        if let Some(entity_type) = &opts.entity_type {
            if &job.job_type != entity_type {
                return false;
            }
        }
        if let Some(parent_id) = &opts.parent_id {
            if job.parent_id.as_ref() != Some(parent_id) {
                return false;
            }
        }
        true
    }

    fn sort_jobs(jobs: &mut [&Job], order_by: OrderBy, order_dir: OrderDir) {
        jobs.sort_by(|a, b| {
            let ord = match order_by {
                OrderBy::CreatedAt | OrderBy::UpdatedAt => a.created_at_epoch_ms.cmp(&b.created_at_epoch_ms),
                OrderBy::StartedAt => a.started_at_epoch_ms.cmp(&b.started_at_epoch_ms),
                OrderBy::FinishedAt => a.finished_at_epoch_ms.cmp(&b.finished_at_epoch_ms),
                OrderBy::Status => status_rank(a.status).cmp(&status_rank(b.status)),
                OrderBy::Name => a.name.cmp(&b.name),
                OrderBy::Type => a.job_type.cmp(&b.job_type),
            };
            // Tie-break on id for deterministic pagination.
            let ord = ord.then_with(|| a.id.as_str().cmp(b.id.as_str()));
            match order_dir {
                OrderDir::Asc => ord,
                OrderDir::Desc => ord.reverse(),
            }
        });
    }

    /// Fold an `Event` into state. Idempotent: replaying the same event
    /// twice (once for immediate visibility, once during WAL replay)
    /// must not change the outcome.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobCreated { job } => {
                if self.jobs.contains_key(&job.id) {
                    return;
                }
                if let Some(parent_id) = &job.parent_id {
                    let siblings = self.children.entry(parent_id.clone()).or_default();
                    if !siblings.contains(&job.id) {
                        siblings.push(job.id.clone());
                    }
                }
                self.jobs.insert(job.id.clone(), job.clone());
            }

            Event::JobStarted { job_id, epoch_ms } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    let _ = job.transition(JobStatus::Running, *epoch_ms);
                }
            }

            Event::JobCompleted { job_id, epoch_ms } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    let _ = job.transition(JobStatus::Completed, *epoch_ms);
                }
            }

            Event::JobFailed { job_id, error, epoch_ms } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    let _ = job.mark_failed(error.clone(), *epoch_ms);
                }
            }

            Event::JobCancelling { .. } => {
                // Audit-trail only; cancellation signaling is in-memory
                // (CancellationToken), not part of durable Job state.
            }

            Event::JobCancelled { job_id, epoch_ms } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    let _ = job.transition(JobStatus::Cancelled, *epoch_ms);
                }
            }

            Event::JobProgress { job_id, progress_current, progress_total } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    job.set_progress(*progress_current, *progress_total);
                }
            }

            Event::JobMetadataUpdated { job_id, metadata } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    for (k, v) in metadata {
                        job.metadata.insert(k.clone(), v.clone());
                    }
                }
            }

            Event::JobDeleted { job_id, .. } => {
                let descendants = self.descendants_of(job_id);
                for id in &descendants {
                    self.jobs.remove(id);
                    self.children.remove(id);
                }
                self.jobs.remove(job_id);
                self.children.remove(job_id);
                for siblings in self.children.values_mut() {
                    siblings.retain(|id| id != job_id);
                }
            }

            Event::StepStarted { job_id, step_name, step_id, epoch_ms } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    job.start_step(step_name.clone(), step_id.clone(), *epoch_ms);
                }
            }

            Event::StepCompleted { job_id, epoch_ms, .. } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    job.finish_step(JobStatus::Completed, *epoch_ms);
                }
            }

            Event::StepFailed { job_id, epoch_ms, .. } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    job.finish_step(JobStatus::Failed, *epoch_ms);
                }
            }

            Event::LogAppended { entry } => {
                if let Some(job) = self.jobs.get_mut(&entry.job_id) {
                    job.line_number_counter = job.line_number_counter.max(entry.line_number);
                }
            }

            Event::Custom => {}
        }
    }
}

fn status_rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Pending => 0,
        JobStatus::Running => 1,
        JobStatus::Completed => 2,
        JobStatus::Failed => 3,
        JobStatus::Cancelled => 4,
    }
}

/// Ordering helper used by `QueueStore` when it needs to compare two
/// jobs outside of a full `list_jobs` pass (e.g. merge/verify code).
pub fn compare_jobs(a: &Job, b: &Job, order_by: OrderBy) -> Ordering {
    match order_by {
        OrderBy::CreatedAt | OrderBy::UpdatedAt => a.created_at_epoch_ms.cmp(&b.created_at_epoch_ms),
        OrderBy::StartedAt => a.started_at_epoch_ms.cmp(&b.started_at_epoch_ms),
        OrderBy::FinishedAt => a.finished_at_epoch_ms.cmp(&b.finished_at_epoch_ms),
        OrderBy::Status => status_rank(a.status).cmp(&status_rank(b.status)),
        OrderBy::Name => a.name.cmp(&b.name),
        OrderBy::Type => a.job_type.cmp(&b.job_type),
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
