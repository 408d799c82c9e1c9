// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_core::{Event, JobBuilder, JobConfig, JobId, JobStatus, ListJobsOptions};

fn child_of(parent: &JobId, name: &str) -> oj_core::Job {
    let config = JobConfig::builder("crawl", name).parent_id(parent.clone()).build();
    oj_core::Job::new_with_epoch_ms(config, 1_000)
}

#[test]
fn job_created_builds_children_index() {
    let mut state = MaterializedState::default();
    let root: oj_core::Job = JobBuilder::default().name("root").build();
    let root_id = root.id.clone();
    state.apply_event(&Event::JobCreated { job: root });

    let child = child_of(&root_id, "child-a");
    let child_id = child.id.clone();
    state.apply_event(&Event::JobCreated { job: child });

    assert_eq!(state.children_of(&root_id), &[child_id.clone()]);
    assert_eq!(state.descendants_of(&root_id), vec![child_id]);
}

#[test]
fn descendants_of_is_transitive() {
    let mut state = MaterializedState::default();
    let root: oj_core::Job = JobBuilder::default().name("root").build();
    let root_id = root.id.clone();
    state.apply_event(&Event::JobCreated { job: root });

    let mid = child_of(&root_id, "mid");
    let mid_id = mid.id.clone();
    state.apply_event(&Event::JobCreated { job: mid });

    let leaf = child_of(&mid_id, "leaf");
    let leaf_id = leaf.id.clone();
    state.apply_event(&Event::JobCreated { job: leaf });

    let mut descendants = state.descendants_of(&root_id);
    descendants.sort_by_key(|j| j.as_str().to_string());
    let mut expected = vec![mid_id, leaf_id];
    expected.sort_by_key(|j| j.as_str().to_string());
    assert_eq!(descendants, expected);
}

#[test]
fn job_deleted_cascades_to_descendants() {
    let mut state = MaterializedState::default();
    let root: oj_core::Job = JobBuilder::default().name("root").build();
    let root_id = root.id.clone();
    state.apply_event(&Event::JobCreated { job: root });

    let child = child_of(&root_id, "child");
    let child_id = child.id.clone();
    state.apply_event(&Event::JobCreated { job: child });

    state.apply_event(&Event::JobDeleted { job_id: root_id.clone(), cascade_count: 2 });

    assert!(state.get_job(&root_id).is_none());
    assert!(state.get_job(&child_id).is_none());
    assert!(state.children_of(&root_id).is_empty());
}

#[test]
fn child_stats_partitions_child_count() {
    let mut state = MaterializedState::default();
    let root: oj_core::Job = JobBuilder::default().name("root").build();
    let root_id = root.id.clone();
    state.apply_event(&Event::JobCreated { job: root });

    for i in 0..3 {
        let child = child_of(&root_id, &format!("child-{i}"));
        state.apply_event(&Event::JobCreated { job: child });
    }
    let children: Vec<JobId> = state.children_of(&root_id).to_vec();
    state.apply_event(&Event::JobStarted { job_id: children[0].clone(), epoch_ms: 2_000 });
    state.apply_event(&Event::JobCompleted { job_id: children[1].clone(), epoch_ms: 3_000 });

    let stats = state.child_stats(&root_id);
    assert_eq!(stats.child_count, 3);
    assert_eq!(stats.pending_children, 1);
    assert_eq!(stats.running_children, 1);
    assert_eq!(stats.completed_children, 1);
}

#[test]
fn list_jobs_filters_by_status_and_parent() {
    let mut state = MaterializedState::default();
    let root: oj_core::Job = JobBuilder::default().name("root").build();
    let root_id = root.id.clone();
    state.apply_event(&Event::JobCreated { job: root });

    let child_a = child_of(&root_id, "a");
    let child_a_id = child_a.id.clone();
    state.apply_event(&Event::JobCreated { job: child_a });
    let child_b = child_of(&root_id, "b");
    state.apply_event(&Event::JobCreated { job: child_b });
    state.apply_event(&Event::JobStarted { job_id: child_a_id.clone(), epoch_ms: 2_000 });

    let opts = ListJobsOptions {
        limit: 10,
        parent_id: Some(root_id.clone()),
        status: vec![JobStatus::Running],
        ..Default::default()
    };
    let running = state.list_jobs(&opts);
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, child_a_id);
}

#[test]
fn list_jobs_limit_zero_returns_empty() {
    let mut state = MaterializedState::default();
    let root: oj_core::Job = JobBuilder::default().name("root").build();
    state.apply_event(&Event::JobCreated { job: root });

    let opts = ListJobsOptions { limit: 0, ..Default::default() };
    assert!(state.list_jobs(&opts).is_empty());
}

#[test]
fn log_appended_raises_counter_monotonically() {
    let mut state = MaterializedState::default();
    let root: oj_core::Job = JobBuilder::default().name("root").build();
    let root_id = root.id.clone();
    state.apply_event(&Event::JobCreated { job: root });

    let entry = oj_core::LogEntry {
        job_id: root_id.clone(),
        line_number: 5,
        level: oj_core::LogLevel::Info,
        timestamp: "12:00".into(),
        full_timestamp: "2026-01-01T12:00:00Z".into(),
        message: "hello".into(),
        step_name: None,
        step_id: None,
        source_type: "crawl".into(),
        originator: "system".into(),
        phase: String::new(),
    };
    state.apply_event(&Event::LogAppended { entry });

    assert_eq!(state.get_job(&root_id).unwrap().line_number_counter, 5);
}
