// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log Service (spec §4.3): the read path over the Log Store and Queue
//! Store, producing aggregated, ordered, paginated log views across a
//! job and (optionally) its descendants.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::sync::Arc;

use oj_core::{Clock, JobId, LevelFilter, LogEntry, LogLevel, OjError};
use oj_core::{JobMetadataView, MAX_AGGREGATED_LOG_LIMIT, MAX_JOB_LOG_LIMIT};
use oj_storage::{LogStore, QueueStore};
use oj_wire::Cursor;

use crate::RuntimeError;

/// Result of `GetAggregatedLogs`.
#[derive(Debug, Clone)]
pub struct AggregatedLogs {
    pub entries: Vec<LogEntry>,
    pub metadata: HashMap<JobId, JobMetadataView>,
    pub next_cursor: Option<Cursor>,
}

pub struct LogService<C: Clock> {
    queue: Arc<QueueStore<C>>,
    logs: Arc<LogStore>,
}

impl<C: Clock> LogService<C> {
    pub fn new(queue: Arc<QueueStore<C>>, logs: Arc<LogStore>) -> Self {
        Self { queue, logs }
    }

    /// `GetAggregatedLogs` (spec §4.3).
    pub fn get_aggregated_logs(
        &self,
        job_id: &JobId,
        include_children: bool,
        level: LevelFilter,
        limit: usize,
        cursor: Option<&Cursor>,
        ascending: bool,
    ) -> Result<AggregatedLogs, RuntimeError> {
        if self.queue.get_job(job_id).is_none() {
            return Err(RuntimeError::Core(OjError::not_found(format!("job {job_id}"))));
        }
        let cap = if include_children { MAX_AGGREGATED_LOG_LIMIT } else { MAX_JOB_LOG_LIMIT };
        let contributing = self.contributing_jobs(job_id, include_children);

        // §8 boundary behavior: limit=0 is a distinct case from a
        // negative/missing limit (which the wire layer already defaults
        // before reaching here) — it returns an empty page and leaves
        // the cursor non-advancing, rather than falling through to the
        // merge with an artificial floor of 1.
        if limit == 0 {
            let metadata = self.metadata_for(job_id, &contributing);
            return Ok(AggregatedLogs { entries: Vec::new(), metadata, next_cursor: cursor.cloned() });
        }
        let limit = limit.min(cap);

        let frontier: HashMap<JobId, u64> =
            cursor.map(|c| c.frontier.iter().copied().collect()).unwrap_or_default();

        // Fast path (spec §4.3): a single contributing job needs no
        // merge, only the frontier filter and a page cut.
        let mut candidates: HashMap<JobId, Vec<LogEntry>> = HashMap::with_capacity(contributing.len());
        for job in &contributing {
            let bound = frontier.get(job).copied().unwrap_or(u64::MAX);
            let entries =
                fetch_level(&self.logs, job, level).into_iter().filter(|e| e.line_number <= bound).collect();
            candidates.insert(*job, entries);
        }

        let (entries, next_frontier) = merge(&contributing, candidates, limit);

        let entries = if ascending { entries.into_iter().rev().collect() } else { entries };

        let next_cursor = if next_frontier.iter().all(|(_, line)| *line == 0) {
            None
        } else {
            Some(Cursor { frontier: next_frontier })
        };

        let metadata = self.metadata_for(job_id, &contributing);
        Ok(AggregatedLogs { entries, metadata, next_cursor })
    }

    /// `CountAggregatedLogs` (spec §4.3).
    pub fn count_aggregated_logs(
        &self,
        job_id: &JobId,
        include_children: bool,
        level: LevelFilter,
    ) -> Result<usize, RuntimeError> {
        if self.queue.get_job(job_id).is_none() {
            return Err(RuntimeError::Core(OjError::not_found(format!("job {job_id}"))));
        }
        let contributing = self.contributing_jobs(job_id, include_children);
        Ok(contributing.iter().map(|job| count_level(&self.logs, job, level)).sum())
    }

    fn contributing_jobs(&self, job_id: &JobId, include_children: bool) -> Vec<JobId> {
        if !include_children {
            return vec![*job_id];
        }
        let mut jobs = self.queue.descendants_of(job_id);
        jobs.push(*job_id);
        jobs
    }

    /// Depth of each contributing job below `root`, plus its
    /// name/type/parent for the UI's tree rendering (spec §4.3 point 5).
    fn metadata_for(&self, root: &JobId, contributing: &[JobId]) -> HashMap<JobId, JobMetadataView> {
        contributing
            .iter()
            .filter_map(|id| {
                let job = self.queue.get_job(id)?;
                let depth = self.depth_below(root, id);
                let job_url = job
                    .config
                    .get("url")
                    .or_else(|| job.payload.get("url"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                Some((
                    *id,
                    JobMetadataView {
                        job_name: job.name,
                        job_url,
                        job_depth: depth,
                        job_type: job.job_type,
                        parent_id: job.parent_id,
                    },
                ))
            })
            .collect()
    }

    fn depth_below(&self, root: &JobId, job_id: &JobId) -> u32 {
        let mut depth = 0u32;
        let mut current = *job_id;
        while current != *root {
            match self.queue.get_job(&current).and_then(|j| j.parent_id) {
                Some(parent) => {
                    current = parent;
                    depth += 1;
                }
                None => break,
            }
        }
        depth
    }
}

/// Per-job log fetch honoring level semantics (spec §4.3 point 2). The
/// Log Store's own `get_logs_at_or_above` already returns a single
/// job's streams unioned and ordered by `line_number` descending, so no
/// merge is needed at this layer for a single job's contribution.
fn fetch_level(logs: &LogStore, job: &JobId, level: LevelFilter) -> Vec<LogEntry> {
    match level {
        LevelFilter::All => logs.get_logs(job, usize::MAX),
        LevelFilter::AtOrAbove(LogLevel::Debug) => logs.get_logs(job, usize::MAX),
        LevelFilter::AtOrAbove(LogLevel::Error) => logs.get_logs_by_level(job, LogLevel::Error, usize::MAX),
        LevelFilter::AtOrAbove(min) => logs.get_logs_at_or_above(job, min, usize::MAX),
    }
}

fn count_level(logs: &LogStore, job: &JobId, level: LevelFilter) -> usize {
    match level {
        LevelFilter::All | LevelFilter::AtOrAbove(LogLevel::Debug) => logs.count_logs(job),
        LevelFilter::AtOrAbove(min) => [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error]
            .into_iter()
            .filter(|level| *level >= min)
            .map(|level| logs.count_logs_by_level(job, level))
            .sum(),
    }
}

/// K-way merge (spec §4.3 point 3): at each step, emit the contributing
/// job whose current head has the greatest `line_number`, ties broken by
/// job id lexicographically — the same ordering as `LogEntry::merge_key`,
/// reimplemented on `HeapItem` below since `BinaryHeap` needs an owned,
/// `'static` key rather than one borrowing from the entry. Returns the
/// merged page (newest first) and the per-job frontier for the next
/// page (0 for an exhausted job).
fn merge(
    contributing: &[JobId],
    mut candidates: HashMap<JobId, Vec<LogEntry>>,
    limit: usize,
) -> (Vec<LogEntry>, Vec<(JobId, u64)>) {
    let mut cursors: HashMap<JobId, usize> = contributing.iter().map(|j| (*j, 0usize)).collect();
    let mut heap: BinaryHeap<HeapItem> = BinaryHeap::with_capacity(contributing.len());

    for job in contributing {
        if let Some(entry) = candidates.get(job).and_then(|v| v.first()) {
            heap.push(HeapItem { line_number: entry.line_number, job_id: *job });
        }
    }

    let mut out = Vec::with_capacity(limit.min(256));
    while out.len() < limit {
        let Some(HeapItem { job_id, .. }) = heap.pop() else { break };
        #[allow(clippy::expect_used)]
        let idx = cursors.get_mut(&job_id).expect("contributing job tracked in cursors");
        let entry = candidates[&job_id][*idx].clone();
        *idx += 1;
        out.push(entry);

        if let Some(next) = candidates.get(&job_id).and_then(|v| v.get(*idx)) {
            heap.push(HeapItem { line_number: next.line_number, job_id });
        }
    }

    let next_frontier = contributing
        .iter()
        .map(|job| {
            let idx = cursors[job];
            let next_line = candidates.get(job).and_then(|v| v.get(idx)).map(|e| e.line_number).unwrap_or(0);
            (*job, next_line)
        })
        .collect();

    (out, next_frontier)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapItem {
    line_number: u64,
    job_id: JobId,
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line_number.cmp(&other.line_number).then_with(|| self.job_id.as_str().cmp(other.job_id.as_str()))
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
#[path = "log_service_tests.rs"]
mod tests;
