// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;

#[test]
fn new_job_starts_pending_with_zero_progress() {
    let clock = FakeClock::new();
    let config = JobConfig::builder("crawl", "seed crawl").build();
    let job = Job::new(config, &clock);
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.progress_current, 0);
    assert!(job.started_at_epoch_ms.is_none());
}

#[test]
fn transition_to_running_sets_started_at_once() {
    let mut job = Job::builder().build();
    job.transition(JobStatus::Running, 100).unwrap();
    assert_eq!(job.started_at_epoch_ms, Some(100));
    // Re-entering running (e.g. a duplicate WAL replay) must not move it.
    job.transition(JobStatus::Running, 200).unwrap();
    assert_eq!(job.started_at_epoch_ms, Some(100));
}

#[test]
fn terminal_job_rejects_reentry_to_non_terminal() {
    let mut job = Job::builder().status(JobStatus::Completed).build();
    let err = job.transition(JobStatus::Running, 100).unwrap_err();
    assert!(matches!(err, OjError::Invariant(_)));
}

#[test]
fn repeated_terminal_transition_is_a_noop_success() {
    let mut job = Job::builder().status(JobStatus::Cancelled).build();
    assert!(job.transition(JobStatus::Cancelled, 999).is_ok());
}

#[test]
fn mark_failed_records_error_and_finishes() {
    let mut job = Job::builder().status(JobStatus::Running).build();
    job.mark_failed("boom", 50).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("boom"));
    assert_eq!(job.finished_at_epoch_ms, Some(50));
}

#[test]
fn progress_clamps_to_total() {
    let mut job = Job::builder().build();
    job.set_progress(3, Some(10));
    assert_eq!(job.progress_current, 3);
    job.set_progress(50, None);
    assert_eq!(job.progress_current, 10);
}

#[test]
fn line_numbers_are_monotonic() {
    let mut job = Job::builder().build();
    assert_eq!(job.next_line_number(), 1);
    assert_eq!(job.next_line_number(), 2);
    assert_eq!(job.line_number_counter, 2);
}

#[test]
fn step_lifecycle_finalizes_most_recent_step() {
    let mut job = Job::builder().build();
    job.start_step("crawl", None, 10);
    assert_eq!(job.steps.len(), 1);
    assert_eq!(job.steps[0].status, JobStatus::Running);
    job.finish_step(JobStatus::Completed, 20);
    assert_eq!(job.steps[0].status, JobStatus::Completed);
    assert_eq!(job.steps[0].finished_at_epoch_ms, Some(20));
    // Re-finishing is a no-op (idempotent under replay).
    job.finish_step(JobStatus::Failed, 30);
    assert_eq!(job.steps[0].status, JobStatus::Completed);
}
