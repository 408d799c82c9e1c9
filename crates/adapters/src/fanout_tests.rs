// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::mock::MockJobHandle;
use crate::JobHandle;
use oj_core::JobId;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn returns_ok_once_all_children_terminal() {
    let jobs = MockJobHandle::new();
    let parent = JobId::new();
    let mut children = Vec::new();
    for _ in 0..3 {
        children.push(jobs.create_child_job(parent, "crawl_url", "x", serde_json::Value::Null).await.unwrap());
    }
    for child in &children[..2] {
        jobs.set_status(child, JobStatus::Completed);
    }

    let jobs_clone = jobs.clone();
    let children_clone = children.clone();
    let handle = tokio::spawn(async move {
        wait_for_children(
            "step",
            &children_clone,
            &jobs_clone,
            &CancellationToken::new(),
            Duration::from_secs(600),
            Duration::from_millis(5),
        )
        .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    jobs.set_status(&children[2], JobStatus::Completed);

    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn fails_when_any_child_fails() {
    let jobs = MockJobHandle::new();
    let parent = JobId::new();
    let a = jobs.create_child_job(parent, "crawl_url", "a", serde_json::Value::Null).await.unwrap();
    let b = jobs.create_child_job(parent, "crawl_url", "b", serde_json::Value::Null).await.unwrap();
    jobs.set_status(&a, JobStatus::Completed);
    jobs.set_status(&b, JobStatus::Failed);

    let result = wait_for_children(
        "step",
        &[a, b],
        &jobs,
        &CancellationToken::new(),
        Duration::from_secs(600),
        Duration::from_millis(5),
    )
    .await;
    assert!(matches!(result, Err(AdapterError::FanOutFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn times_out_when_children_never_finish() {
    let jobs = MockJobHandle::new();
    let parent = JobId::new();
    let a = jobs.create_child_job(parent, "crawl_url", "a", serde_json::Value::Null).await.unwrap();

    let result = wait_for_children(
        "step",
        &[a],
        &jobs,
        &CancellationToken::new(),
        Duration::from_millis(30),
        Duration::from_millis(10),
    )
    .await;
    assert!(matches!(result, Err(AdapterError::FanOutTimeout { .. })));
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_the_wait() {
    let jobs = MockJobHandle::new();
    let parent = JobId::new();
    let a = jobs.create_child_job(parent, "crawl_url", "a", serde_json::Value::Null).await.unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result =
        wait_for_children("step", &[a], &jobs, &cancel, Duration::from_secs(600), Duration::from_millis(5)).await;
    assert!(matches!(result, Err(AdapterError::Core(oj_core::OjError::Cancelled(_)))));
}
