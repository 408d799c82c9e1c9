// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj logs ...`: paginated reads against `GET /logs` and a live tail
//! against `GET /logs/stream`.

use anyhow::Result;
use clap::{Args, Subcommand};
use oj_core::JobId;
use oj_wire::{LogScope, LogsQuery, Query, Request, Response, SseEvent};

use crate::client::{expect_ok, DaemonClient, SubscribeOutcome};
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// Fetch one page of logs (aggregated across descendants, or a
    /// single job's own stream with `--no-children`).
    Get(LogsArgs),
    /// Tail logs live as the daemon pushes them.
    Stream(LogsArgs),
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    #[arg(long)]
    job: String,
    #[arg(long, default_value = "all")]
    level: String,
    /// Page size; omit for the default, or pass `0` explicitly for an
    /// empty page (used to check for new logs without fetching any).
    #[arg(long, default_value_t = -1)]
    limit: i64,
    #[arg(long, default_value = "desc")]
    order: String,
    #[arg(long)]
    cursor: Option<String>,
    /// Aggregate logs across the job's descendant subtree (the default
    /// for a parent job); pass `--no-children` for the job's own stream.
    #[arg(long, default_value_t = true)]
    include_children: bool,
    #[arg(long)]
    step: Option<String>,
}

impl LogsArgs {
    fn to_query(&self) -> LogsQuery {
        LogsQuery {
            scope: LogScope::Job,
            job_id: Some(JobId::from_string(&self.job)),
            level: self.level.clone(),
            limit: self.limit,
            order: self.order.clone(),
            cursor: self.cursor.clone(),
            include_children: self.include_children,
            step: self.step.clone(),
        }
    }
}

pub async fn run(client: &DaemonClient, command: LogsCommand, format: OutputFormat) -> Result<()> {
    match command {
        LogsCommand::Get(args) => get(client, args, format).await,
        LogsCommand::Stream(args) => stream(client, args, format).await,
    }
}

async fn get(client: &DaemonClient, args: LogsArgs, format: OutputFormat) -> Result<()> {
    let query = args.to_query();
    let response = expect_ok(client.request(Request::Query { query: Query::GetLogs { query } }).await?)?;
    match response {
        Response::Logs { logs, count, total_count, next_cursor, .. } => match format {
            OutputFormat::Json => print_json(&serde_json::json!({
                "logs": logs,
                "count": count,
                "total_count": total_count,
                "next_cursor": next_cursor,
            }))?,
            OutputFormat::Text => {
                print_log_lines(&logs);
                if let Some(cursor) = next_cursor {
                    println!("{}", crate::color::muted(&format!("-- next: --cursor {cursor}")));
                }
            }
        },
        Response::StepGroupedLogs { steps, .. } => match format {
            OutputFormat::Json => print_json(&steps)?,
            OutputFormat::Text => {
                for group in steps {
                    println!(
                        "{} [{}] ({} lines)",
                        crate::color::header(&group.step_name),
                        crate::color::status(&group.status.to_string()),
                        group.total_count
                    );
                    print_log_lines(&group.logs);
                }
            }
        },
        other => anyhow::bail!("unexpected response from daemon: {other:?}"),
    }
    Ok(())
}

async fn stream(client: &DaemonClient, args: LogsArgs, format: OutputFormat) -> Result<()> {
    let query = args.to_query();
    match client.subscribe_logs(query).await? {
        SubscribeOutcome::Rejected(Response::Error { message, .. }) => {
            anyhow::bail!("daemon rejected subscription: {message}")
        }
        SubscribeOutcome::Rejected(other) => anyhow::bail!("unexpected rejection: {other:?}"),
        SubscribeOutcome::Streaming(mut stream) => {
            while let Some(event) = stream.next_event().await? {
                match event {
                    SseEvent::Logs { entries, .. } => match format {
                        OutputFormat::Json => print_json(&entries)?,
                        OutputFormat::Text => print_log_lines(&entries),
                    },
                    SseEvent::Status { job_id, status, step_name } => match format {
                        OutputFormat::Json => print_json(&serde_json::json!({
                            "job_id": job_id,
                            "status": status,
                            "step_name": step_name,
                        }))?,
                        OutputFormat::Text => println!(
                            "{} -> {}{}",
                            job_id,
                            crate::color::status(&status.to_string()),
                            step_name.map(|s| format!(" ({s})")).unwrap_or_default()
                        ),
                    },
                    SseEvent::Ping => {}
                }
            }
            Ok(())
        }
    }
}

fn print_log_lines(entries: &[oj_core::LogEntry]) {
    for entry in entries {
        println!(
            "{} {} [{}] {}",
            crate::color::muted(&entry.full_timestamp),
            entry.job_id,
            crate::color::status(&entry.level.to_string()),
            entry.message
        );
    }
}
