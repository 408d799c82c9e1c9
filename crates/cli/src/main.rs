// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj`: the operator CLI for the job orchestration daemon. Every
//! subcommand opens a fresh connection to `ojd`'s Control/Log API
//! socket, sends one request (or, for `logs stream`, holds the
//! connection open as a one-way event stream), and prints the result
//! in the chosen output format.

mod client;
mod color;
mod commands;
mod daemon_process;
mod exit_error;
mod output;
mod table;

use clap::{Parser, Subcommand};

use client::DaemonClient;
use commands::{daemon::DaemonCommand, job::JobCommand, logs::LogsCommand};
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "oj", version, about = "Operator CLI for the job orchestration daemon", styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for commands that print structured data.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Path to the daemon's Unix control socket.
    #[arg(long, global = true)]
    socket: Option<std::path::PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage individual jobs.
    #[command(subcommand)]
    Job(JobCommand),
    /// Read or tail job logs.
    #[command(subcommand)]
    Logs(LogsCommand),
    /// Start, stop, or check the daemon process.
    #[command(subcommand)]
    Daemon(DaemonCommand),
}

fn main() -> std::process::ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start tokio runtime: {err}");
            return std::process::ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            if let Some(exit_err) = err.downcast_ref::<ExitError>() {
                eprintln!("error: {}", exit_err.message);
                return std::process::ExitCode::from(exit_err.code as u8);
            }
            eprintln!("error: {err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let socket_path = cli.socket.unwrap_or_else(client::default_socket_path);
    let client = DaemonClient::new(socket_path.clone());

    match cli.command {
        Commands::Job(command) => commands::job::run(&client, command, cli.format).await,
        Commands::Logs(command) => commands::logs::run(&client, command, cli.format).await,
        Commands::Daemon(command) => commands::daemon::run(&client, &socket_path, command, cli.format).await,
    }
}
