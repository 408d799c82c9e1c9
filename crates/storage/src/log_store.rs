// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log Store (§4.1): append-only per-job log persistence with
//! level-filtered, ordered reads.
//!
//! One JSONL segment file per job under `<root>/job/<job_id>.log`,
//! mirrored by an in-memory per-job index (`Vec<LogEntry>` in insertion
//! order, plus small per-level position vectors) rebuilt from the
//! segment file on first touch. `line_number` assignment is guarded by a
//! per-job `parking_lot::Mutex` so concurrent `Append`s on the same job
//! get distinct, strictly increasing numbers (§5).

use oj_core::{LogEntry, LogLevel};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

struct JobLog {
    file: File,
    entries: Vec<LogEntry>,
    /// level -> positions into `entries`, in the same order.
    by_level: HashMap<LogLevel, Vec<usize>>,
    counter: u64,
}

impl JobLog {
    fn open(path: &Path) -> Result<Self, LogStoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).read(true).open(path)?;

        let mut entries = Vec::new();
        let mut by_level: HashMap<LogLevel, Vec<usize>> = HashMap::new();
        let reader = BufReader::new(file.try_clone()?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: LogEntry = serde_json::from_str(&line)?;
            by_level.entry(entry.level).or_default().push(entries.len());
            entries.push(entry);
        }
        let counter = entries.last().map(|e| e.line_number).unwrap_or(0);

        Ok(Self { file, entries, by_level, counter })
    }

    fn append(&mut self, mut entry: LogEntry) -> Result<LogEntry, LogStoreError> {
        self.counter += 1;
        entry.line_number = self.counter;
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_all()?;
        self.by_level.entry(entry.level).or_default().push(self.entries.len());
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Newest-first, up to `limit`.
    fn get_logs(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    fn get_logs_by_level(&self, level: LogLevel, limit: usize) -> Vec<LogEntry> {
        let Some(positions) = self.by_level.get(&level) else { return Vec::new() };
        positions.iter().rev().take(limit).map(|&i| self.entries[i].clone()).collect()
    }

    /// Union of every stream at or above `min_level`, merged by
    /// `line_number` descending. Used by the Log Service's fast path for
    /// `info`/`warn` filters (§4.3).
    fn get_logs_at_or_above(&self, min_level: LogLevel, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().rev().filter(|e| e.level >= min_level).take(limit).cloned().collect()
    }

    fn count(&self) -> usize {
        self.entries.len()
    }

    fn count_by_level(&self, level: LogLevel) -> usize {
        self.by_level.get(&level).map(|v| v.len()).unwrap_or(0)
    }
}

/// Append-only per-job log persistence.
pub struct LogStore {
    root: PathBuf,
    jobs: RwLock<HashMap<oj_core::JobId, Arc<Mutex<JobLog>>>>,
}

impl LogStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root, jobs: RwLock::new(HashMap::new()) }
    }

    fn log_path(&self, job_id: &oj_core::JobId) -> PathBuf {
        self.root.join("job").join(format!("{job_id}.log"))
    }

    fn job_log(&self, job_id: &oj_core::JobId) -> Result<Arc<Mutex<JobLog>>, LogStoreError> {
        if let Some(log) = self.jobs.read().get(job_id) {
            return Ok(Arc::clone(log));
        }
        let mut jobs = self.jobs.write();
        if let Some(log) = jobs.get(job_id) {
            return Ok(Arc::clone(log));
        }
        let log = Arc::new(Mutex::new(JobLog::open(&self.log_path(job_id))?));
        jobs.insert(job_id.clone(), Arc::clone(&log));
        Ok(log)
    }

    /// Append a log entry, assigning its `line_number`. Returns the
    /// stored entry (with line_number filled in) so callers (the Event
    /// Bus publisher) can forward the authoritative copy.
    pub fn append(&self, entry: LogEntry) -> Result<LogEntry, LogStoreError> {
        let log = self.job_log(&entry.job_id)?;
        let mut log = log.lock();
        log.append(entry)
    }

    pub fn get_logs(&self, job_id: &oj_core::JobId, limit: usize) -> Vec<LogEntry> {
        match self.job_log(job_id) {
            Ok(log) => log.lock().get_logs(limit),
            Err(_) => Vec::new(),
        }
    }

    pub fn get_logs_by_level(&self, job_id: &oj_core::JobId, level: LogLevel, limit: usize) -> Vec<LogEntry> {
        match self.job_log(job_id) {
            Ok(log) => log.lock().get_logs_by_level(level, limit),
            Err(_) => Vec::new(),
        }
    }

    pub fn get_logs_at_or_above(&self, job_id: &oj_core::JobId, min_level: LogLevel, limit: usize) -> Vec<LogEntry> {
        match self.job_log(job_id) {
            Ok(log) => log.lock().get_logs_at_or_above(min_level, limit),
            Err(_) => Vec::new(),
        }
    }

    pub fn count_logs(&self, job_id: &oj_core::JobId) -> usize {
        match self.job_log(job_id) {
            Ok(log) => log.lock().count(),
            Err(_) => 0,
        }
    }

    pub fn count_logs_by_level(&self, job_id: &oj_core::JobId, level: LogLevel) -> usize {
        match self.job_log(job_id) {
            Ok(log) => log.lock().count_by_level(level),
            Err(_) => 0,
        }
    }

    /// Remove a job's log stream entirely (§4.7: never leak log streams
    /// on delete).
    pub fn delete_logs(&self, job_id: &oj_core::JobId) -> Result<(), LogStoreError> {
        self.jobs.write().remove(job_id);
        let path = self.log_path(job_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "log_store_tests.rs"]
mod tests;
