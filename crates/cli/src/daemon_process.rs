// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manage the `ojd` background process: spawn it detached, write a pid
//! file next to its log, and tear it down on `oj daemon stop`. Process
//! liveness is checked by shelling out to `kill -0` rather than reaching
//! for a raw `libc::kill` — this workspace forbids `unsafe_code`, and a
//! signal check is not worth lifting that ban for.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::client::state_dir;

pub fn pid_file() -> PathBuf {
    state_dir().join("daemon.pid")
}

pub fn log_file() -> PathBuf {
    state_dir().join("daemon.log")
}

/// Read the pid file and confirm the process is actually still alive
/// (the file can outlive a crashed daemon).
pub fn running_pid() -> Option<u32> {
    let text = std::fs::read_to_string(pid_file()).ok()?;
    let pid: u32 = text.trim().parse().ok()?;
    if process_alive(pid) {
        Some(pid)
    } else {
        None
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    false
}

/// Spawn `ojd` as a detached background process. Returns once the
/// daemon's socket appears or its startup log reports a failure,
/// whichever comes first, so callers get a quick, truthful result
/// instead of a bare "started".
pub async fn start(socket_path: &std::path::Path, bin: Option<PathBuf>) -> Result<u32> {
    if let Some(pid) = running_pid() {
        bail!("daemon already running (pid {pid})");
    }

    let state_dir = state_dir();
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("creating state dir {}", state_dir.display()))?;

    let bin = bin.unwrap_or_else(ojd_binary_path);
    let log_path = log_file();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening daemon log {}", log_path.display()))?;
    let log_file_err = log_file.try_clone().context("cloning daemon log handle")?;

    let child = std::process::Command::new(&bin)
        .stdin(Stdio::null())
        .stdout(log_file)
        .stderr(log_file_err)
        .spawn()
        .with_context(|| format!("spawning daemon binary {}", bin.display()))?;
    let pid = child.id();
    std::fs::write(pid_file(), pid.to_string())?;
    // Dropping `child` here does not signal it on Unix; the daemon keeps
    // running as an independent process and we never wait on it.
    drop(child);

    wait_for_startup(socket_path, &log_path, Duration::from_secs(5)).await?;
    Ok(pid)
}

async fn wait_for_startup(socket_path: &std::path::Path, log_path: &std::path::Path, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if socket_path.exists() {
            return Ok(());
        }
        if let Ok(log) = std::fs::read_to_string(log_path) {
            if let Some(err) = parse_startup_error(&log) {
                bail!("daemon failed to start: {err}");
            }
        }
        if tokio::time::Instant::now() >= deadline {
            bail!("timed out waiting for daemon to start, see {}", log_path.display());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Send SIGTERM to a running daemon and wait briefly for it to exit.
pub async fn stop() -> Result<()> {
    let Some(pid) = running_pid() else {
        bail!("daemon is not running");
    };
    #[cfg(unix)]
    {
        std::process::Command::new("kill")
            .arg(pid.to_string())
            .status()
            .context("sending SIGTERM to daemon")?;
    }
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while process_alive(pid) {
        if tokio::time::Instant::now() >= deadline {
            bail!("daemon (pid {pid}) did not exit within 5s");
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let _ = std::fs::remove_file(pid_file());
    Ok(())
}

fn ojd_binary_path() -> PathBuf {
    if let Ok(path) = std::env::var("OJD_BIN") {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("ojd")))
        .unwrap_or_else(|| PathBuf::from("ojd"))
}

/// Scan a daemon startup log for the last startup attempt's failure
/// line. The daemon marks each attempt with a `--- ojd: starting (pid:
/// ...) ---` banner; a failed attempt logs an `ERROR ... Failed to
/// start daemon: <cause>` line after it. Only the most recent attempt
/// is considered — an old failure followed by a clean restart must not
/// be reported as current.
pub fn parse_startup_error(log: &str) -> Option<String> {
    const MARKER: &str = "--- ojd: starting";
    const NEEDLE: &str = "Failed to start daemon: ";
    if !log.contains(MARKER) {
        return None;
    }
    let last_attempt = log.rsplit(MARKER).next()?;
    for line in last_attempt.lines() {
        if !line.contains("ERROR") {
            continue;
        }
        if let Some(idx) = line.find(NEEDLE) {
            return Some(line[idx + NEEDLE.len()..].trim().to_string());
        }
    }
    None
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
