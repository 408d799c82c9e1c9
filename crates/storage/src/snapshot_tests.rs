// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::MaterializedState;
use oj_core::{Job, JobBuilder};
use std::io::Write;
use tempfile::tempdir;

fn sample_state() -> MaterializedState {
    let mut state = MaterializedState::default();
    let job: Job = JobBuilder::default().name("root").build();
    state.jobs.insert(job.id.clone(), job);
    state
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snap.json");

    let snapshot = Snapshot::new(42, sample_state());
    snapshot.save(&path).unwrap();

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 42);
    assert_eq!(loaded.state.jobs.len(), 1);
}

#[test]
fn load_missing_file_returns_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.json");
    assert!(Snapshot::load(&path).unwrap().is_none());
}

#[test]
fn corrupt_snapshot_is_rotated_to_bak() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snap.json");

    let mut f = File::create(&path).unwrap();
    f.write_all(b"not json").unwrap();
    drop(f);

    let loaded = Snapshot::load(&path).unwrap();
    assert!(loaded.is_none());
    assert!(path.with_extension("bak").exists());
}
