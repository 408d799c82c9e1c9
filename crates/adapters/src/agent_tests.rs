// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::mock::MockJobHandle;
use oj_core::JobId;
use oj_runbook::ActionKind;
use serde_json::json;
use tokio::time::Duration;

fn step(action: ActionKind, config: serde_json::Value) -> Step {
    Step { name: "classify-docs".into(), action, config }
}

#[tokio::test]
async fn rejects_missing_document_ids() {
    let jobs = MockJobHandle::new();
    let manager = AgentManager::default();
    let err = manager
        .create_parent_job(&step(ActionKind::Classify, json!({})), JobId::new(), &jobs, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidConfig { .. }));
}

#[tokio::test(start_paused = true)]
async fn one_child_per_document_completes_the_step() {
    let jobs = MockJobHandle::new();
    let manager = AgentManager::default();
    let parent = JobId::new();
    let s = step(ActionKind::Classify, json!({ "document_ids": ["d1", "d2", "d3"] }));

    let jobs_clone = jobs.clone();
    let handle =
        tokio::spawn(async move { manager.create_parent_job(&s, parent, &jobs_clone, CancellationToken::new()).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let step_job = jobs.children_of(&parent)[0].clone();
    let children = jobs.children_of(&step_job);
    assert_eq!(children.len(), 3);
    for child in &children {
        jobs.set_status(child, JobStatus::Completed);
    }

    let result = handle.await.unwrap();
    assert_eq!(result.unwrap(), step_job);
}
