// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared `JobHandle` test double used by every Step Manager's unit
//! tests. Not part of the public API — `#[cfg(test)]` only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use oj_core::{JobId, JobStatus, LogLevel, OjError};
use parking_lot::Mutex;
use serde_json::Value;

use crate::JobHandle;

#[derive(Debug, Clone)]
pub struct LoggedLine {
    pub job_id: JobId,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Default)]
struct Inner {
    statuses: HashMap<JobId, JobStatus>,
    children_of: HashMap<JobId, Vec<JobId>>,
    logs: Vec<LoggedLine>,
}

/// A fake Job Manager. Every created job starts `Pending`; tests drive
/// completion by calling `set_status` directly (simulating what a real
/// Worker Pool would do asynchronously).
#[derive(Clone, Default)]
pub struct MockJobHandle {
    inner: Arc<Mutex<Inner>>,
}

impl MockJobHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_of(&self, id: &JobId) -> Option<JobStatus> {
        self.inner.lock().statuses.get(id).copied()
    }

    pub fn set_status(&self, id: &JobId, status: JobStatus) {
        self.inner.lock().statuses.insert(id.clone(), status);
    }

    pub fn children_of(&self, parent: &JobId) -> Vec<JobId> {
        self.inner.lock().children_of.get(parent).cloned().unwrap_or_default()
    }

    pub fn logs(&self) -> Vec<LoggedLine> {
        self.inner.lock().logs.clone()
    }
}

#[async_trait]
impl JobHandle for MockJobHandle {
    async fn create_child_job(&self, parent_id: JobId, _job_type: &str, _name: &str, _config: Value) -> Result<JobId, OjError> {
        let id = JobId::new();
        let mut inner = self.inner.lock();
        inner.statuses.insert(id.clone(), JobStatus::Pending);
        inner.children_of.entry(parent_id).or_default().push(id.clone());
        Ok(id)
    }

    async fn get_job_status(&self, id: &JobId) -> Result<JobStatus, OjError> {
        self.inner.lock().statuses.get(id).copied().ok_or_else(|| OjError::not_found(format!("job {id}")))
    }

    async fn set_status(&self, id: &JobId, status: JobStatus, _error: Option<String>) -> Result<(), OjError> {
        self.inner.lock().statuses.insert(id.clone(), status);
        Ok(())
    }

    async fn create_step_job(&self, parent_id: JobId, job_type: &str, name: &str, config: Value) -> Result<JobId, OjError> {
        self.create_child_job(parent_id, job_type, name, config).await
    }

    async fn append_log(&self, job_id: &JobId, level: LogLevel, message: &str) -> Result<(), OjError> {
        self.inner.lock().logs.push(LoggedLine { job_id: job_id.clone(), level, message: message.to_string() });
        Ok(())
    }
}
