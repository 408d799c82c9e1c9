//! `oj job ...` against a live daemon: create, list, show, cancel,
//! copy, delete, and stats.

use crate::prelude::*;

fn started() -> Project {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    project
}

fn created_job_id(out: &str) -> String {
    out.trim().strip_prefix("created ").expect("create output prefix").to_string()
}

#[test]
fn create_then_show_roundtrips_name_and_payload() {
    let project = started();
    let out = project
        .oj()
        .args(&["job", "create", "--type", "crawl", "--name", "nightly crawl", "--payload", r#"{"url":"https://example.com"}"#])
        .passes()
        .stdout();
    let id = created_job_id(&out);

    project
        .oj()
        .args(&["job", "show", &id])
        .passes()
        .stdout_has("nightly crawl")
        .stdout_has("pending");
}

#[test]
fn show_unknown_job_fails() {
    let project = started();
    project.oj().args(&["job", "show", "does-not-exist"]).fails();
}

#[test]
fn list_shows_created_job() {
    let project = started();
    let out = project
        .oj()
        .args(&["job", "create", "--type", "crawl", "--name", "listed job", "--payload", "{}"])
        .passes()
        .stdout();
    let id = created_job_id(&out);

    project.oj().args(&["job", "list"]).passes().stdout_has(&id[..8.min(id.len())]);
}

#[test]
fn list_grouped_separates_parent_and_children() {
    let project = started();
    let out = project
        .oj()
        .args(&["job", "create", "--type", "parent", "--name", "batch", "--payload", "{}"])
        .passes()
        .stdout();
    let parent_id = created_job_id(&out);

    project
        .oj()
        .args(&["job", "create", "--type", "crawl_url", "--name", "child", "--payload", "{}", "--parent", &parent_id])
        .passes();

    project.oj().args(&["job", "list", "--grouped"]).passes().stdout_has("batch");
}

#[test]
fn cancel_running_job_reports_cancelled() {
    let project = started();
    let out = project
        .oj()
        .args(&["job", "create", "--type", "crawl", "--name", "to cancel", "--payload", "{}"])
        .passes()
        .stdout();
    let id = created_job_id(&out);

    project.oj().args(&["job", "cancel", &id]).passes().stdout_has(&format!("cancelled {id}"));
    project.oj().args(&["job", "show", &id]).passes().stdout_has("cancelled");
}

#[test]
fn cancel_unknown_job_fails() {
    let project = started();
    project.oj().args(&["job", "cancel", "does-not-exist"]).fails();
}

#[test]
fn copy_creates_new_pending_job_with_same_config() {
    let project = started();
    let out = project
        .oj()
        .args(&["job", "create", "--type", "crawl", "--name", "source job", "--payload", r#"{"url":"x"}"#])
        .passes()
        .stdout();
    let source_id = created_job_id(&out);

    let copy_out = project.oj().args(&["job", "copy", &source_id]).passes().stdout();
    assert!(copy_out.contains(&source_id), "expected copy output to reference source id: {copy_out}");
}

#[test]
fn delete_parent_reports_cascade_count() {
    let project = started();
    let out = project
        .oj()
        .args(&["job", "create", "--type", "parent", "--name", "to delete", "--payload", "{}"])
        .passes()
        .stdout();
    let parent_id = created_job_id(&out);
    project
        .oj()
        .args(&["job", "create", "--type", "crawl_url", "--name", "child", "--payload", "{}", "--parent", &parent_id])
        .passes();

    project
        .oj()
        .args(&["job", "delete", &parent_id])
        .passes()
        .stdout_has("cascade_deleted=2")
        .stdout_has("child_count=1");

    project.oj().args(&["job", "show", &parent_id]).fails();
}

#[test]
fn stats_counts_created_job_as_pending() {
    let project = started();
    project
        .oj()
        .args(&["job", "create", "--type", "crawl", "--name", "stats job", "--payload", "{}"])
        .passes();

    project.oj().args(&["job", "stats"]).passes().stdout_has("pending");
}
