//! Shared scaffolding for the `oj-specs` integration tests: spawns the
//! real `oj`/`ojd` binaries as subprocesses against an isolated state
//! directory, same as an operator would from a shell.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

pub const SPEC_WAIT_MAX_MS: u64 = 2000;

/// Poll `condition` every 10ms until it returns true or `timeout_ms` elapses.
pub fn wait_for(timeout_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn target_dir() -> PathBuf {
    let mut path = std::env::current_exe().expect("current test binary path");
    // current_exe is .../target/<profile>/deps/specs-<hash>
    path.pop(); // deps
    path.pop(); // <profile>
    path
}

fn binary_path(name: &str) -> PathBuf {
    let exe = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    let dir = target_dir();
    let candidate = dir.join(&exe);
    if candidate.exists() {
        return candidate;
    }
    // llvm-cov and similar wrappers nest the profile dir one level deeper.
    let nested = dir.parent().map(|p| p.join(&exe));
    if let Some(nested) = nested {
        if nested.exists() {
            return nested;
        }
    }
    candidate
}

pub fn oj_binary() -> PathBuf {
    binary_path("oj")
}

pub fn ojd_binary() -> PathBuf {
    binary_path("ojd")
}

pub struct CliBuilder {
    program: PathBuf,
    args: Vec<String>,
    dir: PathBuf,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.current_dir(&self.dir).args(&self.args).stdin(Stdio::null());
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command
    }

    pub fn run(&self) -> Output {
        self.command().output().expect("spawning cli process")
    }

    pub fn passes(&self) -> RunAssert {
        let output = self.run();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        RunAssert { output }
    }

    pub fn fails(&self) -> RunAssert {
        let output = self.run();
        assert!(
            !output.status.success(),
            "expected failure, got success\nstdout: {}",
            String::from_utf8_lossy(&output.stdout),
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).to_string()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).to_string()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout().contains(needle), "expected stdout to contain {needle:?}, got: {}", self.stdout());
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout().contains(needle), "expected stdout to lack {needle:?}, got: {}", self.stdout());
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr().contains(needle), "expected stderr to contain {needle:?}, got: {}", self.stderr());
        self
    }
}

/// An isolated project: its own state dir (`OJ_STATE_DIR`), with a
/// `Drop` impl that best-effort stops any daemon it started so tests
/// never leak processes into later runs.
pub struct Project {
    state_dir: TempDir,
    work_dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            state_dir: tempfile::tempdir().expect("state tempdir"),
            work_dir: tempfile::tempdir().expect("work tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn socket_path(&self) -> PathBuf {
        self.state_path().join("daemon.sock")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.state_path().join("daemon.pid")
    }

    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("daemon.log")).unwrap_or_default()
    }

    pub fn oj(&self) -> CliBuilder {
        CliBuilder {
            program: oj_binary(),
            args: Vec::new(),
            dir: self.path().to_path_buf(),
            envs: vec![
                ("OJ_STATE_DIR".to_string(), self.state_path().display().to_string()),
                ("OJD_BIN".to_string(), ojd_binary().display().to_string()),
                ("NO_COLOR".to_string(), "1".to_string()),
            ],
        }
    }

    /// Kill the daemon with SIGKILL, simulating a crash instead of a
    /// graceful `oj daemon stop`.
    #[cfg(unix)]
    pub fn daemon_kill(&self) -> bool {
        let Ok(text) = std::fs::read_to_string(self.pid_path()) else { return false };
        let Ok(pid) = text.trim().parse::<u32>() else { return false };
        Command::new("kill")
            .args(["-KILL", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        let _ = self.oj().args(&["daemon", "stop"]).run();
    }
}
