// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ojd`: the daemon binary. Loads configuration, opens durable state,
//! discovers job definitions from an optional runbook directory, and
//! serves the Control/Log API until asked to shut down.

use std::path::PathBuf;

use oj_daemon::{Daemon, DaemonConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

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
            error!(%err, "Failed to start daemon: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    println!("--- ojd: starting (pid: {}) ---\n", std::process::id());

    let runbook_dir = std::env::var("OJ_RUNBOOK_DIR").ok().map(PathBuf::from);

    let config = DaemonConfig::load_default()?.apply_env_overrides();
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.log_dir)?;

    info!(state_dir = %config.state_dir.display(), "Starting daemon");

    let daemon = Daemon::start(config, runbook_dir).await?;

    let shutdown = CancellationToken::new();
    let serve_shutdown = shutdown.clone();
    let serve_daemon = daemon.clone();
    let serve = tokio::spawn(async move { oj_daemon::listener::serve(serve_daemon, serve_shutdown).await });

    wait_for_signal().await;
    info!("shutdown signal received, draining");
    shutdown.cancel();
    daemon.shutdown().await;

    match serve.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!(%err, "listener exited with error"),
        Err(err) => error!(%err, "listener task panicked"),
    }

    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let term = signal(SignalKind::terminate());
    let int = signal(SignalKind::interrupt());
    let (mut term, mut int) = match (term, int) {
        (Ok(term), Ok(int)) => (term, int),
        _ => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = term.recv() => {}
        _ = int.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
