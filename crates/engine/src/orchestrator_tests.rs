// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event_bus::EventBus;
use oj_adapters::{AdapterError, JobHandle, StepManager};
use oj_core::{FakeClock, JobStatus, ListJobsOptions};
use oj_runbook::{ActionKind, JobDefinition, Step};
use oj_storage::{LogStore, QueueStore};
use serde_json::json;
use std::time::Duration;
use tempfile::tempdir;

fn orchestrator(registry: StepManagerRegistry) -> (Orchestrator<FakeClock>, Arc<JobManager<FakeClock>>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let queue = Arc::new(QueueStore::open(dir.path().join("wal.jsonl"), clock.clone()).unwrap());
    let logs = Arc::new(LogStore::new(dir.path().join("logs")));
    let events = Arc::new(EventBus::new());
    let jobs = Arc::new(JobManager::new(queue, logs, events, clock));
    let orch = Orchestrator::new(Arc::clone(&jobs), Arc::new(registry));
    (orch, jobs, dir)
}

fn step(name: &str, action: ActionKind) -> Step {
    Step { name: name.to_string(), action, config: json!({}) }
}

fn definition(steps: Vec<Step>) -> JobDefinition {
    JobDefinition {
        name: "ingest".to_string(),
        job_type: WORKFLOW_JOB_TYPE.to_string(),
        schedule: None,
        source_type: None,
        tags: vec![],
        steps,
    }
}

fn only_job(jobs: &JobManager<FakeClock>) -> JobId {
    jobs.list_jobs(&ListJobsOptions { limit: 10, ..Default::default() })[0].id
}

struct AlwaysSucceeds;
#[async_trait::async_trait]
impl StepManager for AlwaysSucceeds {
    fn manager_type(&self) -> &'static str {
        "succeeds"
    }
    fn returns_child_jobs(&self) -> bool {
        false
    }
    async fn create_parent_job(
        &self,
        step: &Step,
        parent_job_id: JobId,
        jobs: &dyn JobHandle,
        _cancel: tokio_util::sync::CancellationToken,
    ) -> Result<JobId, AdapterError> {
        let id = jobs.create_step_job(parent_job_id, "noop", &step.name, step.config.clone()).await?;
        jobs.set_status(&id, JobStatus::Running, None).await?;
        jobs.set_status(&id, JobStatus::Completed, None).await?;
        Ok(id)
    }
}

struct AlwaysFails;
#[async_trait::async_trait]
impl StepManager for AlwaysFails {
    fn manager_type(&self) -> &'static str {
        "fails"
    }
    fn returns_child_jobs(&self) -> bool {
        false
    }
    async fn create_parent_job(
        &self,
        step: &Step,
        parent_job_id: JobId,
        jobs: &dyn JobHandle,
        _cancel: tokio_util::sync::CancellationToken,
    ) -> Result<JobId, AdapterError> {
        let id = jobs.create_step_job(parent_job_id, "noop", &step.name, step.config.clone()).await?;
        jobs.set_status(&id, JobStatus::Failed, Some("boom".to_string())).await?;
        Err(AdapterError::Core(oj_core::OjError::validation("boom")))
    }
}

struct WaitsThenCancels;
#[async_trait::async_trait]
impl StepManager for WaitsThenCancels {
    fn manager_type(&self) -> &'static str {
        "waits"
    }
    fn returns_child_jobs(&self) -> bool {
        true
    }
    async fn create_parent_job(
        &self,
        step: &Step,
        parent_job_id: JobId,
        jobs: &dyn JobHandle,
        cancel: tokio_util::sync::CancellationToken,
    ) -> Result<JobId, AdapterError> {
        let _id = jobs.create_step_job(parent_job_id, "noop", &step.name, step.config.clone()).await?;
        cancel.cancelled().await;
        Err(AdapterError::Core(oj_core::OjError::cancelled("cancelled mid step")))
    }
}

#[tokio::test]
async fn runs_every_step_to_completion() {
    let (orch, jobs, _dir) = orchestrator({
        let mut r = StepManagerRegistry::default();
        r.register("crawl", Arc::new(AlwaysSucceeds));
        r.register("transform", Arc::new(AlwaysSucceeds));
        r
    });

    let def = definition(vec![step("fetch", ActionKind::Crawl), step("normalize", ActionKind::Transform)]);
    let parent_id = orch.run(&def, json!({}), CancellationToken::new()).await.unwrap();

    let job = jobs.get_job(&parent_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.steps.len(), 2);
    assert!(job.steps.iter().all(|s| s.status == JobStatus::Completed));
}

#[tokio::test]
async fn stops_at_the_first_failing_step() {
    let (orch, jobs, _dir) = orchestrator({
        let mut r = StepManagerRegistry::default();
        r.register("crawl", Arc::new(AlwaysSucceeds));
        r.register("transform", Arc::new(AlwaysFails));
        r.register("agent", Arc::new(AlwaysSucceeds));
        r
    });

    let def = definition(vec![
        step("fetch", ActionKind::Crawl),
        step("normalize", ActionKind::Transform),
        step("classify", ActionKind::Agent),
    ]);
    let err = orch.run(&def, json!({}), CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Adapter(_)));

    let job = jobs.get_job(&only_job(&jobs)).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.steps.len(), 2);
}

#[tokio::test]
async fn external_cancel_before_any_step_marks_the_workflow_cancelled() {
    let (orch, jobs, _dir) = orchestrator({
        let mut r = StepManagerRegistry::default();
        r.register("crawl", Arc::new(AlwaysSucceeds));
        r
    });
    let def = definition(vec![step("fetch", ActionKind::Crawl)]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = orch.run(&def, json!({}), cancel).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Core(OjError::Cancelled(_))));

    let job = jobs.get_job(&only_job(&jobs)).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn cancellation_observed_mid_step_marks_the_workflow_cancelled() {
    let (orch, jobs, _dir) = orchestrator({
        let mut r = StepManagerRegistry::default();
        r.register("crawl", Arc::new(WaitsThenCancels));
        r
    });
    let def = definition(vec![step("fetch", ActionKind::Crawl)]);
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel_clone.cancel();
    });

    let err = orch.run(&def, json!({}), cancel).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Adapter(_)));

    let job = jobs.get_job(&only_job(&jobs)).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
}
