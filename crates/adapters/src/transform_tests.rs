// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::mock::MockJobHandle;
use oj_core::JobId;
use serde_json::json;

#[tokio::test]
async fn rejects_missing_command() {
    let jobs = MockJobHandle::new();
    let manager = TransformManager::default();
    let step = Step { name: "html-to-md".into(), action: oj_runbook::ActionKind::Transform, config: json!({}) };
    let err = manager.create_parent_job(&step, JobId::new(), &jobs, CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, AdapterError::InvalidConfig { action: "transform", .. }));
}

#[tokio::test]
async fn successful_command_completes_the_step_job() {
    let jobs = MockJobHandle::new();
    let manager = TransformManager::default();
    let step = Step {
        name: "html-to-md".into(),
        action: oj_runbook::ActionKind::Transform,
        config: json!({ "command": "true", "args": [] }),
    };
    let job_id = manager.create_parent_job(&step, JobId::new(), &jobs, CancellationToken::new()).await.unwrap();
    assert_eq!(jobs.status_of(&job_id), Some(JobStatus::Completed));
}

#[tokio::test]
async fn failing_command_fails_the_step_job() {
    let jobs = MockJobHandle::new();
    let manager = TransformManager::default();
    let step = Step {
        name: "html-to-md".into(),
        action: oj_runbook::ActionKind::Transform,
        config: json!({ "command": "false", "args": [] }),
    };
    let result = manager.create_parent_job(&step, JobId::new(), &jobs, CancellationToken::new()).await;
    assert!(result.is_err());
}
