// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_core::{JobId, LogEntry, LogLevel};
use tempfile::tempdir;

fn entry(job_id: &JobId, level: LogLevel, message: &str) -> LogEntry {
    LogEntry {
        job_id: job_id.clone(),
        line_number: 0,
        level,
        timestamp: "12:00:00".into(),
        full_timestamp: "2026-01-01T12:00:00Z".into(),
        message: message.into(),
        step_name: None,
        step_id: None,
        source_type: "crawl".into(),
        originator: "system".into(),
        phase: String::new(),
    }
}

#[test]
fn append_assigns_strictly_increasing_line_numbers() {
    let dir = tempdir().unwrap();
    let store = LogStore::new(dir.path().to_path_buf());
    let job_id = JobId::new();

    let a = store.append(entry(&job_id, LogLevel::Info, "one")).unwrap();
    let b = store.append(entry(&job_id, LogLevel::Info, "two")).unwrap();
    assert_eq!(a.line_number, 1);
    assert_eq!(b.line_number, 2);
}

#[test]
fn get_logs_returns_newest_first() {
    let dir = tempdir().unwrap();
    let store = LogStore::new(dir.path().to_path_buf());
    let job_id = JobId::new();

    store.append(entry(&job_id, LogLevel::Info, "one")).unwrap();
    store.append(entry(&job_id, LogLevel::Info, "two")).unwrap();
    store.append(entry(&job_id, LogLevel::Info, "three")).unwrap();

    let logs = store.get_logs(&job_id, 2);
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message, "three");
    assert_eq!(logs[1].message, "two");
}

#[test]
fn get_logs_by_level_filters_exact_level() {
    let dir = tempdir().unwrap();
    let store = LogStore::new(dir.path().to_path_buf());
    let job_id = JobId::new();

    store.append(entry(&job_id, LogLevel::Debug, "dbg")).unwrap();
    store.append(entry(&job_id, LogLevel::Warn, "warn-1")).unwrap();
    store.append(entry(&job_id, LogLevel::Error, "err-1")).unwrap();

    let warns = store.get_logs_by_level(&job_id, LogLevel::Warn, 10);
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0].message, "warn-1");
}

#[test]
fn get_logs_at_or_above_merges_higher_levels() {
    let dir = tempdir().unwrap();
    let store = LogStore::new(dir.path().to_path_buf());
    let job_id = JobId::new();

    store.append(entry(&job_id, LogLevel::Debug, "dbg")).unwrap();
    store.append(entry(&job_id, LogLevel::Info, "info-1")).unwrap();
    store.append(entry(&job_id, LogLevel::Warn, "warn-1")).unwrap();
    store.append(entry(&job_id, LogLevel::Error, "err-1")).unwrap();

    let at_or_above = store.get_logs_at_or_above(&job_id, LogLevel::Info, 10);
    let messages: Vec<&str> = at_or_above.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["err-1", "warn-1", "info-1"]);
}

#[test]
fn count_logs_reflects_appended_total() {
    let dir = tempdir().unwrap();
    let store = LogStore::new(dir.path().to_path_buf());
    let job_id = JobId::new();

    store.append(entry(&job_id, LogLevel::Info, "one")).unwrap();
    store.append(entry(&job_id, LogLevel::Warn, "two")).unwrap();

    assert_eq!(store.count_logs(&job_id), 2);
    assert_eq!(store.count_logs_by_level(&job_id, LogLevel::Warn), 1);
}

#[test]
fn reopening_store_replays_existing_segment() {
    let dir = tempdir().unwrap();
    let job_id = JobId::new();
    {
        let store = LogStore::new(dir.path().to_path_buf());
        store.append(entry(&job_id, LogLevel::Info, "one")).unwrap();
        store.append(entry(&job_id, LogLevel::Info, "two")).unwrap();
    }

    let store = LogStore::new(dir.path().to_path_buf());
    assert_eq!(store.count_logs(&job_id), 2);
    let next = store.append(entry(&job_id, LogLevel::Info, "three")).unwrap();
    assert_eq!(next.line_number, 3);
}

#[test]
fn delete_logs_removes_segment_file() {
    let dir = tempdir().unwrap();
    let store = LogStore::new(dir.path().to_path_buf());
    let job_id = JobId::new();
    store.append(entry(&job_id, LogLevel::Info, "one")).unwrap();

    store.delete_logs(&job_id).unwrap();
    assert_eq!(store.count_logs(&job_id), 0);
}
