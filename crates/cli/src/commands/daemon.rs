// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj daemon ...`: start/stop/status for the local `ojd` process.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use oj_wire::{Request, Response};

use crate::client::DaemonClient;
use crate::daemon_process;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum DaemonCommand {
    /// Spawn `ojd` as a background process.
    Start(StartArgs),
    /// Stop the running `ojd` process.
    Stop,
    /// Report whether the daemon is reachable and its uptime.
    Status,
}

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Path to the `ojd` binary, overriding `OJD_BIN`/sibling lookup.
    #[arg(long)]
    bin: Option<PathBuf>,
}

pub async fn run(client: &DaemonClient, socket_path: &std::path::Path, command: DaemonCommand, format: OutputFormat) -> Result<()> {
    match command {
        DaemonCommand::Start(args) => start(socket_path, args, format).await,
        DaemonCommand::Stop => stop(format).await,
        DaemonCommand::Status => status(client, format).await,
    }
}

async fn start(socket_path: &std::path::Path, args: StartArgs, format: OutputFormat) -> Result<()> {
    let pid = daemon_process::start(socket_path, args.bin).await?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({"pid": pid}))?,
        OutputFormat::Text => println!("daemon started (pid {pid})"),
    }
    Ok(())
}

async fn stop(format: OutputFormat) -> Result<()> {
    daemon_process::stop().await?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({"stopped": true}))?,
        OutputFormat::Text => println!("daemon stopped"),
    }
    Ok(())
}

async fn status(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let Some(pid) = daemon_process::running_pid() else {
        match format {
            OutputFormat::Json => print_json(&serde_json::json!({"running": false}))?,
            OutputFormat::Text => println!("daemon is not running"),
        }
        return Ok(());
    };

    let response = client.request(Request::Status).await?;
    let Response::Status { uptime_secs, jobs_active } = response else {
        anyhow::bail!("unexpected response from daemon: {response:?}");
    };
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "running": true,
            "pid": pid,
            "uptime_secs": uptime_secs,
            "jobs_active": jobs_active,
        }))?,
        OutputFormat::Text => println!("daemon running (pid {pid}, uptime {uptime_secs}s, {jobs_active} active jobs)"),
    }
    Ok(())
}
