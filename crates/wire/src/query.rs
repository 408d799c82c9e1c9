// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query types for reading daemon state: job listings and the
//! aggregated/job-scoped log read path (§6 Control API, Log API).

use oj_core::{
    JobId, LevelFilter, ListJobsOptions, OjError, OrderBy, OrderDir, MAX_AGGREGATED_LOG_LIMIT,
    MAX_JOB_LOG_LIMIT,
};
use serde::{Deserialize, Serialize};

/// Default page size when the caller omits `limit` or supplies a
/// non-positive value (§8 boundary behaviors: negative/zero limit is
/// clamped to a default, not treated as "unlimited").
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Wire shape of `GET /jobs`'s query parameters. Signed so that
/// malformed or negative values from a query string are representable
/// and can be clamped rather than rejected outright.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListJobsQuery {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// Comma-separated disjunction, e.g. `"pending,running"`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub parent_id: Option<JobId>,
    #[serde(default)]
    pub grouped: bool,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order_dir: Option<String>,
}

impl ListJobsQuery {
    /// Validate and clamp into the storage-layer options, per §8's
    /// boundary behaviors.
    pub fn to_options(&self) -> Result<ListJobsOptions, OjError> {
        let limit = if self.limit <= 0 { DEFAULT_LIST_LIMIT } else { self.limit as usize };
        let offset = if self.offset < 0 { 0 } else { self.offset as usize };
        let status = ListJobsOptions::parse_status_csv(&self.status)?;
        let order_by = match &self.order_by {
            Some(s) => OrderBy::parse(s)?,
            None => OrderBy::default(),
        };
        let order_dir = match &self.order_dir {
            Some(s) => OrderDir::parse(s)?,
            None => OrderDir::default(),
        };
        Ok(ListJobsOptions {
            limit,
            offset,
            status,
            source_type: self.source.clone(),
            entity_type: self.entity.clone(),
            parent_id: self.parent_id,
            order_by,
            order_dir,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogScope {
    Job,
    Service,
}

/// Wire shape of `GET /logs`'s query parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogsQuery {
    pub scope: LogScope,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default = "default_level")]
    pub level: String,
    /// Negative means "not specified" and clamps to the default page
    /// size; `0` is a distinct, explicit request for an empty page
    /// (§8 boundary behaviors) and must not be conflated with "omitted".
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub include_children: bool,
    #[serde(default)]
    pub step: Option<String>,
}

fn default_level() -> String {
    "all".to_string()
}

fn default_order() -> String {
    "desc".to_string()
}

fn default_limit() -> i64 {
    -1
}

impl LogsQuery {
    pub fn level_filter(&self) -> Result<LevelFilter, OjError> {
        LevelFilter::parse(&self.level).map_err(|e| OjError::validation(e.to_string()))
    }

    pub fn job_id(&self) -> Result<&JobId, OjError> {
        self.job_id.as_ref().ok_or_else(|| OjError::validation("job_id is required for scope=job"))
    }

    /// Clamp to the job-scope or aggregated-scope cap depending on
    /// `include_children` (§8: 500 for aggregated/service reads, 5000 for
    /// a single job's own stream). `limit=0` is a distinct, explicit
    /// request for an empty page and is passed through as 0 rather than
    /// defaulted; only a negative (or omitted, which deserializes to 0
    /// only via `LogsQuery`'s own default — callers pass it through
    /// unchanged) limit falls back to the default page size.
    pub fn clamped_limit(&self) -> usize {
        let cap = if self.include_children { MAX_AGGREGATED_LOG_LIMIT } else { MAX_JOB_LOG_LIMIT };
        if self.limit == 0 {
            0
        } else if self.limit < 0 {
            DEFAULT_LIST_LIMIT.min(cap)
        } else {
            (self.limit as usize).min(cap)
        }
    }

    pub fn ascending(&self) -> bool {
        self.order.eq_ignore_ascii_case("asc")
    }
}

/// Read-only operations exposed over the wire protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Query {
    ListJobs { query: ListJobsQuery },
    GetJob { id: JobId },
    JobStats,
    GetLogs { query: LogsQuery },
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
