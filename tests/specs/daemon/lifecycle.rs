//! Daemon process lifecycle: start, status, stop, and the pid/socket
//! files they leave behind.

use crate::prelude::*;

#[test]
fn daemon_status_fails_when_not_running() {
    let project = Project::empty();
    project.oj().args(&["daemon", "status"]).passes().stdout_has("daemon is not running");
}

#[test]
fn daemon_start_reports_success() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes().stdout_has("daemon started");
}

#[test]
fn daemon_status_shows_running_after_start() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    project.oj().args(&["daemon", "status"]).passes().stdout_has("daemon running");
}

#[test]
fn daemon_status_shows_job_count() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    project
        .oj()
        .args(&["job", "create", "--type", "crawl", "--name", "nightly", "--payload", "{}"])
        .passes();
    project.oj().args(&["daemon", "status"]).passes().stdout_has("active jobs");
}

#[test]
fn daemon_stop_reports_success() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    project.oj().args(&["daemon", "stop"]).passes().stdout_has("daemon stopped");
}

#[test]
fn daemon_status_fails_after_stop() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    project.oj().args(&["daemon", "stop"]).passes();
    project.oj().args(&["daemon", "status"]).passes().stdout_has("daemon is not running");
}

#[test]
fn daemon_creates_pid_file() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    assert!(project.pid_path().exists(), "expected {} to exist", project.pid_path().display());
}

#[test]
fn daemon_creates_socket_file() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    assert!(project.socket_path().exists(), "expected {} to exist", project.socket_path().display());
}

#[test]
fn daemon_start_fails_when_already_running() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    project.oj().args(&["daemon", "start"]).fails().stderr_has("already running");
}

#[test]
fn ojd_starts_after_previous_daemon_stopped() {
    let project = Project::empty();
    project.oj().args(&["daemon", "start"]).passes();
    project.oj().args(&["daemon", "stop"]).passes();
    project.oj().args(&["daemon", "start"]).passes().stdout_has("daemon started");
    project.oj().args(&["daemon", "status"]).passes().stdout_has("daemon running");
}
