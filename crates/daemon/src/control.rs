// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control API and Log API dispatch (spec §6): turns an `oj_wire::Request`
//! into an `oj_wire::Response` against the Job Manager and Log Service.
//! No transport lives here — the listener (`crate::listener_socket`) reads
//! framed `Request`s off a socket and writes framed `Response`s back; an
//! HTTP host would call the same `handle` function.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use oj_adapters::JobHandle;
use oj_core::{ChildStats, Clock, Job, JobId, JobStatus, ListJobsOptions, OjError};
use oj_engine::{JobManager, LogService};
use oj_wire::{Cursor, ErrorStatus, JobDetail, JobGroup, JobSummary, Query, Request, Response, StepLogGroup};

/// Shared context every request is dispatched against.
pub struct ControlContext<C: Clock> {
    pub jobs: Arc<JobManager<C>>,
    pub logs: Arc<LogService<C>>,
    pub started_at: Instant,
}

pub async fn handle<C: Clock + 'static>(request: Request, ctx: &ControlContext<C>) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { version } => Response::Hello { version },
        Request::Shutdown => Response::ShuttingDown,
        Request::Status => {
            let active = ctx
                .jobs
                .count_jobs(&ListJobsOptions { limit: usize::MAX, status: vec![JobStatus::Running], ..Default::default() });
            Response::Status { uptime_secs: ctx.started_at.elapsed().as_secs(), jobs_active: active }
        }
        Request::Query { query } => handle_query(query, ctx),
        Request::CreateJob { job_type, name, payload, config, parent_id, progress_total } => {
            handle_create_job(ctx, job_type, name, payload, config, parent_id, progress_total).await
        }
        Request::CancelJob { id } => handle_cancel_job(ctx, id).await,
        Request::CopyJob { id } => handle_copy_job(ctx, id),
        Request::DeleteJob { id } => handle_delete_job(ctx, id),
        // The listener intercepts `SubscribeLogs` before it ever reaches
        // `handle` and switches the connection into streaming mode
        // (`crate::listener::stream_logs`); this arm only exists so the
        // match stays exhaustive if that ever changes.
        Request::SubscribeLogs { .. } => Response::Error {
            message: "SubscribeLogs must be handled by the connection listener".to_string(),
            status: ErrorStatus::Invariant,
            job_id: None,
            child_count: None,
        },
    }
}

fn handle_query<C: Clock + 'static>(query: Query, ctx: &ControlContext<C>) -> Response {
    match query {
        Query::ListJobs { query } => handle_list_jobs(ctx, query),
        Query::GetJob { id } => handle_get_job(ctx, id),
        Query::JobStats => handle_job_stats(ctx),
        Query::GetLogs { query } => handle_get_logs(ctx, query),
    }
}

fn handle_list_jobs<C: Clock + 'static>(ctx: &ControlContext<C>, query: oj_wire::ListJobsQuery) -> Response {
    let opts = match query.to_options() {
        Ok(opts) => opts,
        Err(e) => return error_response(&e, None),
    };
    let jobs = ctx.jobs.list_jobs(&opts);

    if !query.grouped {
        return Response::Jobs { jobs: summarize(ctx, &jobs) };
    }

    let parents: Vec<&Job> = jobs.iter().filter(|j| j.parent_id.is_none()).collect();
    let parent_ids: std::collections::HashSet<JobId> = parents.iter().map(|j| j.id).collect();
    let stats = ctx.jobs.job_child_stats(&parent_ids.iter().copied().collect::<Vec<_>>());

    let mut groups = Vec::with_capacity(parents.len());
    let mut orphans = Vec::new();
    for job in &jobs {
        let Some(parent_id) = job.parent_id else { continue };
        if !parent_ids.contains(&parent_id) {
            orphans.push(JobSummary::from_job(job, None));
        }
    }
    for parent in parents {
        let children = jobs
            .iter()
            .filter(|j| j.parent_id == Some(parent.id))
            .map(|j| JobSummary::from_job(j, None))
            .collect();
        groups.push(JobGroup { parent: JobSummary::from_job(parent, stats.get(&parent.id).copied()), children });
    }
    Response::JobGroups { groups, orphans }
}

fn summarize<C: Clock + 'static>(ctx: &ControlContext<C>, jobs: &[Job]) -> Vec<JobSummary> {
    let parent_ids: Vec<JobId> = jobs.iter().filter(|j| j.is_parent_type()).map(|j| j.id).collect();
    let stats = ctx.jobs.job_child_stats(&parent_ids);
    jobs.iter().map(|j| JobSummary::from_job(j, stats.get(&j.id).copied())).collect()
}

fn handle_get_job<C: Clock + 'static>(ctx: &ControlContext<C>, id: JobId) -> Response {
    match ctx.jobs.get_job(&id) {
        Some(job) => {
            let stats = if job.is_parent_type() { ctx.jobs.job_child_stats(&[id]).remove(&id) } else { None };
            Response::Job { job: Some(Box::new(JobDetail::from_job(&job, stats))) }
        }
        None => Response::Job { job: None },
    }
}

fn handle_job_stats<C: Clock + 'static>(ctx: &ControlContext<C>) -> Response {
    let statuses =
        [JobStatus::Pending, JobStatus::Running, JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled];
    let mut counts = HashMap::with_capacity(statuses.len());
    for status in statuses {
        let opts = ListJobsOptions { limit: usize::MAX, status: vec![status], ..Default::default() };
        counts.insert(status_key(status).to_string(), ctx.jobs.count_jobs(&opts) as u64);
    }
    Response::JobStats { counts }
}

fn status_key(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Running => "running",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
        JobStatus::Cancelled => "cancelled",
    }
}

fn handle_get_logs<C: Clock + 'static>(ctx: &ControlContext<C>, query: oj_wire::LogsQuery) -> Response {
    let job_id = match query.job_id() {
        Ok(id) => *id,
        Err(e) => return error_response(&e, None),
    };
    let level = match query.level_filter() {
        Ok(level) => level,
        Err(e) => return error_response(&e, None),
    };
    let cursor = match query.cursor.as_deref().map(Cursor::decode).transpose() {
        Ok(cursor) => cursor,
        Err(e) => return error_response(&e, Some(job_id)),
    };

    if let Some(step_name) = &query.step {
        return handle_step_grouped_logs(ctx, job_id, step_name, level);
    }

    let limit = query.clamped_limit();
    match ctx.logs.get_aggregated_logs(&job_id, query.include_children, level, limit, cursor.as_ref(), query.ascending()) {
        Ok(page) => {
            let total_count = ctx
                .logs
                .count_aggregated_logs(&job_id, query.include_children, level)
                .unwrap_or(page.entries.len());
            let next_cursor = match page.next_cursor.as_ref().map(Cursor::encode).transpose() {
                Ok(token) => token,
                Err(e) => return error_response(&e, Some(job_id)),
            };
            Response::Logs {
                count: page.entries.len(),
                logs: page.entries,
                total_count,
                limit,
                order: if query.ascending() { "asc".to_string() } else { "desc".to_string() },
                level: query.level.clone(),
                include_children: query.include_children,
                metadata: page.metadata,
                next_cursor,
            }
        }
        Err(oj_engine::RuntimeError::Core(e)) => error_response(&e, Some(job_id)),
        Err(other) => error_response(&OjError::invariant(other.to_string()), Some(job_id)),
    }
}

fn handle_step_grouped_logs<C: Clock + 'static>(
    ctx: &ControlContext<C>,
    job_id: JobId,
    step_name: &str,
    level: oj_core::LevelFilter,
) -> Response {
    let Some(job) = ctx.jobs.get_job(&job_id) else {
        return error_response(&OjError::not_found(format!("job {job_id}")), Some(job_id));
    };
    let steps: Vec<StepLogGroup> = job
        .steps
        .iter()
        .filter(|s| s.step_name == step_name)
        .map(|s| {
            let unfiltered = ctx.jobs.logs().get_logs(&job_id, usize::MAX);
            let filtered: Vec<_> = unfiltered
                .iter()
                .filter(|e| e.step_name.as_deref() == Some(step_name.as_ref()) && level.matches(e.level))
                .cloned()
                .collect();
            let unfiltered_for_step =
                unfiltered.iter().filter(|e| e.step_name.as_deref() == Some(step_name.as_ref())).count();
            StepLogGroup {
                step_name: s.step_name.clone(),
                step_id: s.step_id.clone(),
                status: s.status,
                total_count: filtered.len(),
                logs: filtered,
                unfiltered_count: unfiltered_for_step,
            }
        })
        .collect();
    Response::StepGroupedLogs { job_id, steps }
}

async fn handle_create_job<C: Clock + 'static>(
    ctx: &ControlContext<C>,
    job_type: String,
    name: String,
    payload: serde_json::Value,
    config: serde_json::Value,
    parent_id: Option<JobId>,
    progress_total: Option<u64>,
) -> Response {
    let result = match parent_id {
        Some(parent) => ctx.jobs.create_child_job(parent, &job_type, &name, config).await.map_err(oj_engine::RuntimeError::Core),
        None => ctx.jobs.create_job(job_type, name, payload, config, progress_total),
    };
    match result {
        Ok(job_id) => Response::JobCreated { job_id },
        Err(oj_engine::RuntimeError::Core(e)) => error_response(&e, None),
        Err(other) => error_response(&OjError::invariant(other.to_string()), None),
    }
}

async fn handle_cancel_job<C: Clock + 'static>(ctx: &ControlContext<C>, id: JobId) -> Response {
    let Some(job) = ctx.jobs.get_job(&id) else {
        return error_response(&OjError::not_found(format!("job {id}")), Some(id));
    };
    if job.is_terminal() {
        return Response::JobCancelled { job_id: id };
    }
    if job.is_parent_type() {
        if let Err(e) = ctx.jobs.stop_all_child_jobs(&id) {
            return runtime_error_response(&e, Some(id));
        }
    }
    match JobHandle::set_status(ctx.jobs.as_ref(), &id, JobStatus::Cancelled, None).await {
        Ok(()) => Response::JobCancelled { job_id: id },
        Err(e) => error_response(&e, Some(id)),
    }
}

fn handle_copy_job<C: Clock + 'static>(ctx: &ControlContext<C>, id: JobId) -> Response {
    let Some(source) = ctx.jobs.get_job(&id) else {
        return error_response(&OjError::not_found(format!("job {id}")), Some(id));
    };
    match ctx.jobs.create_job(source.job_type.clone(), source.name.clone(), source.payload.clone(), source.config.clone(), source.progress_total) {
        Ok(job_id) => Response::JobCopied { job_id, source_id: id },
        Err(oj_engine::RuntimeError::Core(e)) => error_response(&e, Some(id)),
        Err(other) => error_response(&OjError::invariant(other.to_string()), Some(id)),
    }
}

fn handle_delete_job<C: Clock + 'static>(ctx: &ControlContext<C>, id: JobId) -> Response {
    let child_count = ctx.jobs.job_child_stats(&[id]).get(&id).map(|s: &ChildStats| s.child_count).unwrap_or(0);
    match ctx.jobs.delete_job(&id) {
        Ok(cascade_deleted) => Response::JobDeleted { cascade_deleted, child_count },
        Err(e) => runtime_error_response(&e, Some(id)),
    }
}

fn runtime_error_response(err: &oj_engine::RuntimeError, job_id: Option<JobId>) -> Response {
    match err {
        oj_engine::RuntimeError::Core(e) => error_response(e, job_id),
        other => error_response(&OjError::invariant(other.to_string()), job_id),
    }
}

fn error_response(err: &OjError, job_id: Option<JobId>) -> Response {
    Response::Error { message: err.to_string(), status: ErrorStatus::from(err), job_id, child_count: None }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
