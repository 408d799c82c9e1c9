use std::sync::Arc;
use std::time::Instant;

use oj_core::FakeClock;
use oj_engine::{EventBus, JobManager, LogService};
use oj_storage::{LogStore, QueueStore};
use oj_wire::{ListJobsQuery, LogScope, LogsQuery, Query, Request, Response};
use serde_json::json;
use tempfile::tempdir;

use super::*;

fn context() -> (ControlContext<FakeClock>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let queue = Arc::new(QueueStore::open(dir.path().join("wal.jsonl"), clock.clone()).unwrap());
    let logs = Arc::new(LogStore::new(dir.path().join("logs")));
    let events = Arc::new(EventBus::new());
    let jobs = Arc::new(JobManager::new(queue.clone(), logs.clone(), events, clock));
    let log_service = Arc::new(LogService::new(queue, logs));
    (ControlContext { jobs, logs: log_service, started_at: Instant::now() }, dir)
}

#[tokio::test]
async fn ping_returns_pong() {
    let (ctx, _dir) = context();
    let response = handle(Request::Ping, &ctx).await;
    assert_eq!(response, Response::Pong);
}

#[tokio::test]
async fn status_reports_active_job_count() {
    let (ctx, _dir) = context();
    let id = ctx.jobs.create_job("crawl", "job one", json!({}), json!({}), None).unwrap();
    JobHandle::set_status(ctx.jobs.as_ref(), &id, JobStatus::Running, None).await.unwrap();

    let response = handle(Request::Status, &ctx).await;
    let Response::Status { jobs_active, .. } = response else { panic!("expected Status, got {response:?}") };
    assert_eq!(jobs_active, 1);
}

#[tokio::test]
async fn create_job_then_get_job_roundtrips_through_dispatch() {
    let (ctx, _dir) = context();
    let response = handle(
        Request::CreateJob {
            job_type: "crawl".to_string(),
            name: "nightly crawl".to_string(),
            payload: json!({"url": "https://example.com"}),
            config: json!({}),
            parent_id: None,
            progress_total: None,
        },
        &ctx,
    )
    .await;
    let Response::JobCreated { job_id } = response else { panic!("expected JobCreated, got {response:?}") };

    let response = handle(Request::Query { query: Query::GetJob { id: job_id } }, &ctx).await;
    let Response::Job { job: Some(detail) } = response else { panic!("expected Job, got {response:?}") };
    assert_eq!(detail.summary.name, "nightly crawl");
    assert_eq!(detail.summary.status, JobStatus::Pending);
}

#[tokio::test]
async fn get_job_for_unknown_id_returns_none_not_error() {
    let (ctx, _dir) = context();
    let response = handle(Request::Query { query: Query::GetJob { id: JobId::new() } }, &ctx).await;
    assert_eq!(response, Response::Job { job: None });
}

#[tokio::test]
async fn list_jobs_grouped_separates_parents_children_and_orphans() {
    let (ctx, _dir) = context();
    let parent = ctx.jobs.create_job("parent", "parent run", json!({}), json!({}), None).unwrap();
    let _child = ctx.jobs.create_child_job(parent, "crawl_url", "child", json!({})).await.unwrap();

    let query = ListJobsQuery { grouped: true, limit: 50, ..Default::default() };
    let response = handle(Request::Query { query: Query::ListJobs { query } }, &ctx).await;
    let Response::JobGroups { groups, orphans } = response else { panic!("expected JobGroups, got {response:?}") };
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].children.len(), 1);
    assert!(orphans.is_empty());
}

#[tokio::test]
async fn job_stats_counts_every_known_status() {
    let (ctx, _dir) = context();
    ctx.jobs.create_job("crawl", "a", json!({}), json!({}), None).unwrap();
    let response = handle(Request::Query { query: Query::JobStats }, &ctx).await;
    let Response::JobStats { counts } = response else { panic!("expected JobStats, got {response:?}") };
    assert_eq!(counts["pending"], 1);
    assert_eq!(counts["running"], 0);
}

#[tokio::test]
async fn cancel_job_transitions_running_job_to_cancelled() {
    let (ctx, _dir) = context();
    let id = ctx.jobs.create_job("crawl", "a", json!({}), json!({}), None).unwrap();
    JobHandle::set_status(ctx.jobs.as_ref(), &id, JobStatus::Running, None).await.unwrap();

    let response = handle(Request::CancelJob { id }, &ctx).await;
    assert_eq!(response, Response::JobCancelled { job_id: id });
    assert_eq!(ctx.jobs.get_job(&id).unwrap().status, JobStatus::Cancelled);
}

#[tokio::test]
async fn cancel_unknown_job_returns_not_found_error() {
    let (ctx, _dir) = context();
    let response = handle(Request::CancelJob { id: JobId::new() }, &ctx).await;
    let Response::Error { status, .. } = response else { panic!("expected Error, got {response:?}") };
    assert_eq!(status, ErrorStatus::NotFound);
}

#[tokio::test]
async fn copy_job_creates_new_pending_job_from_source_config() {
    let (ctx, _dir) = context();
    let source = ctx.jobs.create_job("crawl", "original", json!({"url": "x"}), json!({"retries": 3}), None).unwrap();

    let response = handle(Request::CopyJob { id: source }, &ctx).await;
    let Response::JobCopied { job_id, source_id } = response else { panic!("expected JobCopied, got {response:?}") };
    assert_eq!(source_id, source);
    let copy = ctx.jobs.get_job(&job_id).unwrap();
    assert_eq!(copy.status, JobStatus::Pending);
    assert_eq!(copy.payload, json!({"url": "x"}));
}

#[tokio::test]
async fn delete_job_reports_cascade_count() {
    let (ctx, _dir) = context();
    let parent = ctx.jobs.create_job("parent", "parent", json!({}), json!({}), None).unwrap();
    let _child = ctx.jobs.create_child_job(parent, "crawl_url", "child", json!({})).await.unwrap();

    let response = handle(Request::DeleteJob { id: parent }, &ctx).await;
    let Response::JobDeleted { cascade_deleted, child_count } = response else { panic!("expected JobDeleted, got {response:?}") };
    assert_eq!(child_count, 1);
    assert_eq!(cascade_deleted, 2);
    assert!(ctx.jobs.get_job(&parent).is_none());
}

#[tokio::test]
async fn get_logs_with_unknown_job_id_errors_instead_of_returning_empty_page() {
    let (ctx, _dir) = context();
    let query = LogsQuery {
        scope: LogScope::Job,
        job_id: Some(JobId::new()),
        level: "all".to_string(),
        limit: 0,
        order: "desc".to_string(),
        cursor: None,
        include_children: false,
        step: None,
    };
    let response = handle(Request::Query { query: Query::GetLogs { query } }, &ctx).await;
    assert!(matches!(response, Response::Error { .. }));
}

#[tokio::test]
async fn subscribe_logs_request_reaching_dispatch_is_rejected() {
    // `SubscribeLogs` is always intercepted by the listener before this
    // dispatch is reached; this only exercises the defensive fallback.
    let (ctx, _dir) = context();
    let query = LogsQuery {
        scope: LogScope::Job,
        job_id: None,
        level: "all".to_string(),
        limit: 0,
        order: "desc".to_string(),
        cursor: None,
        include_children: false,
        step: None,
    };
    let response = handle(Request::SubscribeLogs { query }, &ctx).await;
    assert!(matches!(response, Response::Error { status: ErrorStatus::Invariant, .. }));
}
