// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, #[source] source: std::io::Error },
    #[error("I/O error reading child output: {0}")]
    Io(#[from] std::io::Error),
}

/// A command to run. Deliberately just `program` + `args` — no shell
/// word-splitting or expansion happens here (see module docs).
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: None, env: HashMap::new(), timeout: None }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of running a command to completion (or to cancellation/timeout).
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub cancelled: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && !self.cancelled && self.exit_code == Some(0)
    }
}

/// Run `spec` to completion, forwarding each stdout/stderr line to
/// `on_line` as it arrives (for log forwarding into a job's log stream
/// as the process runs, rather than only after it exits).
///
/// Honors `cancel` at its only suspension point — the child's exit —
/// and `spec.timeout` as a wall-clock bound. On either, the child is
/// killed and `CommandOutput::cancelled`/`timed_out` is set; this never
/// returns `Err` for a cancelled/timed-out run, only for a failure to
/// spawn or read the child's pipes (§7: transient I/O).
pub async fn run_command(
    spec: &CommandSpec,
    cancel: CancellationToken,
    mut on_line: impl FnMut(&str, bool),
) -> Result<CommandOutput, ShellError> {
    let mut command = Command::new(&spec.program);
    command.args(&spec.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    for (k, v) in &spec.env {
        command.env(k, v);
    }

    let mut child = command.spawn().map_err(|source| ShellError::Spawn { program: spec.program.clone(), source })?;
    #[allow(clippy::expect_used)]
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout piped")).lines();
    #[allow(clippy::expect_used)]
    let mut stderr = BufReader::new(child.stderr.take().expect("stderr piped")).lines();

    let mut output = CommandOutput::default();
    let sleep = match spec.timeout {
        Some(d) => tokio::time::sleep(d),
        None => tokio::time::sleep(Duration::MAX),
    };
    tokio::pin!(sleep);
    let has_deadline = spec.timeout.is_some();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                let _ = child.start_kill();
                output.cancelled = true;
                break;
            }
            _ = &mut sleep, if has_deadline => {
                let _ = child.start_kill();
                output.timed_out = true;
                break;
            }
            line = stdout.next_line() => {
                match line? {
                    Some(line) => {
                        on_line(&line, false);
                        output.stdout.push_str(&line);
                        output.stdout.push('\n');
                    }
                    None => {}
                }
            }
            line = stderr.next_line() => {
                match line? {
                    Some(line) => {
                        on_line(&line, true);
                        output.stderr.push_str(&line);
                        output.stderr.push('\n');
                    }
                    None => {}
                }
            }
            status = child.wait() => {
                output.exit_code = status?.code();
                break;
            }
        }
    }

    if output.cancelled || output.timed_out {
        let _ = child.wait().await;
    }

    Ok(output)
}
