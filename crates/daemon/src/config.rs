// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration (spec §3, §5, §6): the tunables for the Worker
//! Pool, fan-out waits, and the SSE Broker, loaded from a `toml` file
//! with environment overrides, following the teacher's `dirs`-based
//! config directory convention.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, #[source] source: toml::de::Error },
    #[error("no home directory found to resolve a default config path")]
    NoHomeDir,
}

/// Daemon tunables. `Default` matches the values named in §5/§6/§8.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Root state directory for the Queue Store WAL.
    pub state_dir: PathBuf,
    /// Root directory for per-job log segment files.
    pub log_dir: PathBuf,
    /// Unix socket path the Control/Log API listens on.
    pub socket_path: PathBuf,
    /// Optional TCP port for remote connections (Docker/Kubernetes
    /// deployments), mirroring the teacher's `OJ_TCP_PORT` convention.
    pub tcp_port: Option<u16>,
    /// Auth token required for TCP connections. Unused for the Unix
    /// socket, which relies on filesystem permissions.
    pub auth_token: Option<String>,

    /// Worker Pool concurrency (§5: "C workers in parallel").
    pub worker_concurrency: usize,
    /// Worker Pool claim-poll interval.
    pub worker_poll_interval_ms: u64,

    /// Fan-out manager overall wait before a step times out (§5: default
    /// 10 min).
    pub fanout_timeout_secs: u64,
    /// Fan-out manager child-status poll interval.
    pub fanout_poll_interval_ms: u64,

    /// Per-subscriber Event Bus / SSE channel buffer (§5: "recommended
    /// >=10,000 entries for high-throughput log streams").
    pub subscriber_buffer: usize,
    /// SSE Broker's adaptive batch interval ladder, in milliseconds
    /// (§6: "{500 ms, 1 s, 2 s, 3 s, 5 s}").
    pub sse_backoff_ladder_ms: Vec<u64>,
    /// Entry-count threshold per interval above which the SSE Broker
    /// escalates one rung up the ladder (§6: "more than 200 entries").
    pub sse_escalate_threshold: usize,
    /// Entry-count threshold per interval below which the SSE Broker
    /// steps back down the ladder (§6: "fewer than 100 arrive").
    pub sse_deescalate_threshold: usize,
    /// Heartbeat interval for idle SSE subscribers (§6: "every 15 s").
    pub sse_heartbeat_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let state_dir = default_state_dir();
        Self {
            log_dir: state_dir.join("logs"),
            socket_path: state_dir.join("daemon.sock"),
            state_dir,
            tcp_port: None,
            auth_token: None,
            worker_concurrency: 4,
            worker_poll_interval_ms: 200,
            fanout_timeout_secs: 600,
            fanout_poll_interval_ms: 500,
            subscriber_buffer: 10_000,
            sse_backoff_ladder_ms: vec![500, 1_000, 2_000, 3_000, 5_000],
            sse_escalate_threshold: 200,
            sse_deescalate_threshold: 100,
            sse_heartbeat_secs: 15,
        }
    }
}

impl DaemonConfig {
    /// Load from `path`, falling back to `Default` field-by-field for
    /// anything the file omits (`#[serde(default)]` on the struct).
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load from the conventional path (`~/.oj/daemon.toml`, or
    /// `OJ_CONFIG` if set), or fall back to `Default` if no file exists
    /// at all — a missing config file is not an error, an unreadable or
    /// malformed one is.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = config_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides on top of a loaded config, mirroring
    /// the teacher's `OJ_STATE_DIR`/`OJ_TCP_PORT`/`OJ_AUTH_TOKEN`
    /// precedence (env wins over file).
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("OJ_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("OJ_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(port) = std::env::var("OJ_TCP_PORT").ok().and_then(|s| s.parse().ok()) {
            self.tcp_port = Some(port);
        }
        if let Ok(token) = std::env::var("OJ_AUTH_TOKEN") {
            if !token.is_empty() {
                self.auth_token = Some(token);
            }
        }
        self
    }

    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms)
    }

    pub fn fanout_timeout(&self) -> Duration {
        Duration::from_secs(self.fanout_timeout_secs)
    }

    pub fn fanout_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fanout_poll_interval_ms)
    }

    pub fn sse_heartbeat(&self) -> Duration {
        Duration::from_secs(self.sse_heartbeat_secs)
    }
}

fn default_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OJ_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("oj");
    }
    dirs::state_dir().or_else(dirs::home_dir).unwrap_or_else(|| PathBuf::from(".")).join("oj")
}

fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("OJ_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".oj").join("daemon.toml"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
