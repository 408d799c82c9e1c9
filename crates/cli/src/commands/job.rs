// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj job ...`: create, list, show, cancel, copy, and delete jobs
//! against the daemon's Control API.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use oj_core::JobId;
use oj_wire::{ListJobsQuery, Query, Request, Response};

use crate::client::{expect_ok, DaemonClient};
use crate::output::{print_job_detail, print_job_groups, print_job_table, print_json, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// Create a new job.
    Create(CreateArgs),
    /// List jobs, optionally filtered and grouped by parent.
    List(ListArgs),
    /// Show one job's full detail.
    Show(ShowArgs),
    /// Request cooperative cancellation of a running job.
    Cancel(IdArgs),
    /// Duplicate a job's configuration as a new pending job.
    Copy(IdArgs),
    /// Delete a job (and, for a parent, cascade to its children).
    Delete(IdArgs),
    /// Print global job counts by status.
    Stats,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long = "type")]
    job_type: String,
    #[arg(long)]
    name: String,
    /// JSON payload for the job, e.g. `'{"url": "..."}'`.
    #[arg(long)]
    payload: Option<String>,
    /// JSON config blob passed through to the step orchestrator.
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    parent: Option<String>,
    #[arg(long)]
    progress_total: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Comma-separated status filter, e.g. `pending,running`.
    #[arg(long, default_value = "")]
    status: String,
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    entity: Option<String>,
    #[arg(long)]
    parent: Option<String>,
    #[arg(long)]
    grouped: bool,
    #[arg(long, default_value_t = 50)]
    limit: i64,
    #[arg(long, default_value_t = 0)]
    offset: i64,
    #[arg(long)]
    order_by: Option<String>,
    #[arg(long)]
    order_dir: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    id: String,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    id: String,
}

fn parse_json_or_null(raw: Option<String>) -> Result<serde_json::Value> {
    match raw {
        Some(text) => serde_json::from_str(&text).context("parsing JSON argument"),
        None => Ok(serde_json::Value::Null),
    }
}

pub async fn run(client: &DaemonClient, command: JobCommand, format: OutputFormat) -> Result<()> {
    match command {
        JobCommand::Create(args) => create(client, args, format).await,
        JobCommand::List(args) => list(client, args, format).await,
        JobCommand::Show(args) => show(client, args, format).await,
        JobCommand::Cancel(args) => cancel(client, args, format).await,
        JobCommand::Copy(args) => copy(client, args, format).await,
        JobCommand::Delete(args) => delete(client, args, format).await,
        JobCommand::Stats => stats(client, format).await,
    }
}

async fn create(client: &DaemonClient, args: CreateArgs, format: OutputFormat) -> Result<()> {
    let request = Request::CreateJob {
        job_type: args.job_type,
        name: args.name,
        payload: parse_json_or_null(args.payload)?,
        config: parse_json_or_null(args.config)?,
        parent_id: args.parent.map(|s| JobId::from_string(&s)),
        progress_total: args.progress_total,
    };
    let response = expect_ok(client.request(request).await?)?;
    let Response::JobCreated { job_id } = response else {
        anyhow::bail!("unexpected response from daemon: {response:?}");
    };
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({"job_id": job_id}))?,
        OutputFormat::Text => println!("created {job_id}"),
    }
    Ok(())
}

async fn list(client: &DaemonClient, args: ListArgs, format: OutputFormat) -> Result<()> {
    let query = ListJobsQuery {
        limit: args.limit,
        offset: args.offset,
        status: args.status,
        source: args.source,
        entity: args.entity,
        parent_id: args.parent.map(|s| JobId::from_string(&s)),
        grouped: args.grouped,
        order_by: args.order_by,
        order_dir: args.order_dir,
    };
    let response = expect_ok(client.request(Request::Query { query: Query::ListJobs { query } }).await?)?;
    match response {
        Response::Jobs { jobs } => match format {
            OutputFormat::Json => print_json(&jobs)?,
            OutputFormat::Text => print_job_table(&jobs),
        },
        Response::JobGroups { groups, orphans } => match format {
            OutputFormat::Json => print_json(&serde_json::json!({"groups": groups, "orphans": orphans}))?,
            OutputFormat::Text => print_job_groups(&groups, &orphans),
        },
        other => anyhow::bail!("unexpected response from daemon: {other:?}"),
    }
    Ok(())
}

async fn show(client: &DaemonClient, args: ShowArgs, format: OutputFormat) -> Result<()> {
    let id = JobId::from_string(&args.id);
    let response = expect_ok(client.request(Request::Query { query: Query::GetJob { id } }).await?)?;
    let Response::Job { job } = response else {
        anyhow::bail!("unexpected response from daemon: {response:?}");
    };
    let Some(job) = job else {
        anyhow::bail!("job {} not found", args.id);
    };
    match format {
        OutputFormat::Json => print_json(&job)?,
        OutputFormat::Text => print_job_detail(&job),
    }
    Ok(())
}

async fn cancel(client: &DaemonClient, args: IdArgs, format: OutputFormat) -> Result<()> {
    let id = JobId::from_string(&args.id);
    let response = expect_ok(client.request(Request::CancelJob { id }).await?)?;
    let Response::JobCancelled { job_id } = response else {
        anyhow::bail!("unexpected response from daemon: {response:?}");
    };
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({"job_id": job_id}))?,
        OutputFormat::Text => println!("cancelled {job_id}"),
    }
    Ok(())
}

async fn copy(client: &DaemonClient, args: IdArgs, format: OutputFormat) -> Result<()> {
    let id = JobId::from_string(&args.id);
    let response = expect_ok(client.request(Request::CopyJob { id }).await?)?;
    let Response::JobCopied { job_id, source_id } = response else {
        anyhow::bail!("unexpected response from daemon: {response:?}");
    };
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({"job_id": job_id, "source_id": source_id}))?,
        OutputFormat::Text => println!("copied {source_id} -> {job_id}"),
    }
    Ok(())
}

async fn delete(client: &DaemonClient, args: IdArgs, format: OutputFormat) -> Result<()> {
    let id = JobId::from_string(&args.id);
    let response = expect_ok(client.request(Request::DeleteJob { id }).await?)?;
    let Response::JobDeleted { cascade_deleted, child_count } = response else {
        anyhow::bail!("unexpected response from daemon: {response:?}");
    };
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "cascade_deleted": cascade_deleted,
            "child_count": child_count,
        }))?,
        OutputFormat::Text => println!("deleted (cascade_deleted={cascade_deleted}, child_count={child_count})"),
    }
    Ok(())
}

async fn stats(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let response = expect_ok(client.request(Request::Query { query: Query::JobStats }).await?)?;
    let Response::JobStats { counts } = response else {
        anyhow::bail!("unexpected response from daemon: {response:?}");
    };
    match format {
        OutputFormat::Json => print_json(&counts)?,
        OutputFormat::Text => {
            let mut entries: Vec<_> = counts.iter().collect();
            entries.sort_by_key(|(status, _)| (*status).clone());
            for (status, count) in entries {
                println!("{:<12}{count}", crate::color::status(status));
            }
        }
    }
    Ok(())
}
