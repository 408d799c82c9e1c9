// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query option types shared by the Queue Store, Job Manager, and wire
//! layer (`ListJobs`/`CountJobs` options, §4.2).

use crate::error::OjError;
use crate::job::{JobId, JobStatus};

/// Logical sort keys accepted by `order_by`. Unknown names are rejected at
/// parse time, per the Queue Store contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    CreatedAt,
    UpdatedAt,
    StartedAt,
    FinishedAt,
    Status,
    Name,
    Type,
}

impl Default for OrderBy {
    fn default() -> Self {
        OrderBy::CreatedAt
    }
}

impl OrderBy {
    pub fn parse(s: &str) -> Result<Self, OjError> {
        match s {
            "created_at" => Ok(OrderBy::CreatedAt),
            "updated_at" => Ok(OrderBy::UpdatedAt),
            "started_at" => Ok(OrderBy::StartedAt),
            "finished_at" => Ok(OrderBy::FinishedAt),
            "status" => Ok(OrderBy::Status),
            "name" => Ok(OrderBy::Name),
            "type" => Ok(OrderBy::Type),
            other => Err(OjError::validation(format!("unknown order_by {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl Default for OrderDir {
    fn default() -> Self {
        OrderDir::Desc
    }
}

impl OrderDir {
    pub fn parse(s: &str) -> Result<Self, OjError> {
        match s {
            "asc" => Ok(OrderDir::Asc),
            "desc" => Ok(OrderDir::Desc),
            other => Err(OjError::validation(format!("unknown order_dir {other:?}"))),
        }
    }
}

/// Options accepted by `ListJobs`/`CountJobs`.
///
/// `status` supports a comma-separated disjunction at the wire layer;
/// here it is already split into the set of statuses to match (empty
/// means "any status").
#[derive(Debug, Clone, Default)]
pub struct ListJobsOptions {
    pub limit: usize,
    pub offset: usize,
    pub status: Vec<JobStatus>,
    pub source_type: Option<String>,
    pub entity_type: Option<String>,
    pub parent_id: Option<JobId>,
    pub order_by: OrderBy,
    pub order_dir: OrderDir,
}

impl ListJobsOptions {
    /// Parse a comma-separated status list, per §4.2's "comma-list"
    /// disjunction support. An empty string parses to an empty (match-any)
    /// list rather than an error.
    pub fn parse_status_csv(csv: &str) -> Result<Vec<JobStatus>, OjError> {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "pending" => Ok(JobStatus::Pending),
                "running" => Ok(JobStatus::Running),
                "completed" => Ok(JobStatus::Completed),
                "failed" => Ok(JobStatus::Failed),
                "cancelled" => Ok(JobStatus::Cancelled),
                other => Err(OjError::validation(format!("unknown status {other:?}"))),
            })
            .collect()
    }

    pub fn matches_status(&self, status: JobStatus) -> bool {
        self.status.is_empty() || self.status.contains(&status)
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
