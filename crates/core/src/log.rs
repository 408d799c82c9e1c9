// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log entries and level filtering for the Log Pipeline.

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on `limit` for aggregated (Log Service) queries.
pub const MAX_AGGREGATED_LOG_LIMIT: usize = 500;

/// Upper bound on `limit` for single-job (Log Store) queries.
pub const MAX_JOB_LOG_LIMIT: usize = 5000;

/// Severity of a single log line. Ordered so that `a >= b` means "a is at
/// least as severe as b", matching the "at or above" filter semantics in
/// the Log Service contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    LogLevel {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

/// Error returned when a `level` query parameter doesn't match the known
/// set (after aliasing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLogLevel(pub String);

impl std::fmt::Display for InvalidLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid level {:?}, expected one of: debug, info, warn, error, all",
            self.0
        )
    }
}

impl std::error::Error for InvalidLogLevel {}

impl LogLevel {
    /// Parse a bare level (no `all` sentinel). Honors wire aliases
    /// `warning -> warn` and `err -> error`.
    pub fn parse(s: &str) -> Result<Self, InvalidLogLevel> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "err" => Ok(LogLevel::Error),
            other => Err(InvalidLogLevel(other.to_string())),
        }
    }
}

/// A `level` query resolved to either "everything" or "at or above X".
///
/// `debug` and `all` both mean "everything" per the Log Service's level
/// semantics; they're kept distinct at the wire layer (both are accepted
/// input strings) but collapse to the same filter here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelFilter {
    All,
    AtOrAbove(LogLevel),
}

impl LevelFilter {
    pub fn parse(s: &str) -> Result<Self, InvalidLogLevel> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(LevelFilter::All),
            "debug" => Ok(LevelFilter::AtOrAbove(LogLevel::Debug)),
            other => Ok(LevelFilter::AtOrAbove(LogLevel::parse(other)?)),
        }
    }

    pub fn matches(&self, level: LogLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::AtOrAbove(min) => level >= *min,
        }
    }

    /// The "fast path" condition from the Log Service design: levels that
    /// map directly onto a single Log Store stream rather than requiring a
    /// k-way merge across per-level streams.
    pub fn is_single_stream(&self) -> bool {
        matches!(self, LevelFilter::All | LevelFilter::AtOrAbove(LogLevel::Debug) | LevelFilter::AtOrAbove(LogLevel::Error))
    }
}

impl std::fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelFilter::All => write!(f, "all"),
            LevelFilter::AtOrAbove(level) => write!(f, "{level}"),
        }
    }
}

/// A single structured log line appended by an executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub job_id: JobId,
    /// Strictly monotonic within the job, starting at 1.
    pub line_number: u64,
    pub level: LogLevel,
    /// Short, UI-friendly rendering of the timestamp.
    pub timestamp: String,
    /// Absolute timestamp (RFC 3339).
    pub full_timestamp: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub source_type: String,
    #[serde(default = "default_originator")]
    pub originator: String,
    #[serde(default)]
    pub phase: String,
}

fn default_originator() -> String {
    "system".to_string()
}

impl LogEntry {
    /// The merge key used by the Log Service's k-way merge: ties on
    /// `line_number` break on job id, lexicographically.
    pub fn merge_key(&self) -> (u64, &str) {
        (self.line_number, self.job_id.as_str())
    }
}

/// Derived, never-persisted ancestry facts returned alongside aggregated
/// logs so a UI can render each contributing job's place in the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadataView {
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    pub job_depth: u32,
    pub job_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<JobId>,
}

/// Derived, never-persisted per-parent child status counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChildStats {
    pub child_count: u64,
    pub pending_children: u64,
    pub running_children: u64,
    pub completed_children: u64,
    pub failed_children: u64,
    pub cancelled_children: u64,
}

/// Type alias for the open metadata/config maps described in §3 as
/// "opaque" / "open" maps. Kept as a plain JSON value since the set of
/// producers (step managers) is open-ended.
pub type OpenMap = HashMap<String, serde_json::Value>;

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
