// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn successful_command_captures_stdout_and_exit_code() {
    let spec = CommandSpec::new("sh").arg("-c").arg("echo hello");
    let output = run_command(&spec, CancellationToken::new(), |_, _| {}).await.expect("run");
    assert!(output.success());
    assert_eq!(output.stdout.trim(), "hello");
    assert_eq!(output.exit_code, Some(0));
}

#[tokio::test]
async fn failing_command_reports_nonzero_exit_without_erroring() {
    let spec = CommandSpec::new("sh").arg("-c").arg("exit 3");
    let output = run_command(&spec, CancellationToken::new(), |_, _| {}).await.expect("run");
    assert!(!output.success());
    assert_eq!(output.exit_code, Some(3));
}

#[tokio::test]
async fn on_line_callback_sees_stdout_and_stderr_separately() {
    let lines: Arc<Mutex<Vec<(String, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let lines_clone = Arc::clone(&lines);
    let spec = CommandSpec::new("sh").arg("-c").arg("echo out; echo err 1>&2");
    run_command(&spec, CancellationToken::new(), move |line, is_stderr| {
        lines_clone.lock().expect("lock").push((line.to_string(), is_stderr));
    })
    .await
    .expect("run");

    let lines = lines.lock().expect("lock");
    assert!(lines.iter().any(|(l, stderr)| l == "out" && !stderr));
    assert!(lines.iter().any(|(l, stderr)| l == "err" && *stderr));
}

#[tokio::test]
async fn cancellation_kills_child_and_marks_cancelled() {
    let cancel = CancellationToken::new();
    let spec = CommandSpec::new("sleep").arg("30");
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_clone.cancel();
    });
    let output = run_command(&spec, cancel, |_, _| {}).await.expect("run");
    assert!(output.cancelled);
    assert!(!output.timed_out);
}

#[tokio::test]
async fn timeout_kills_child_and_marks_timed_out() {
    let spec = CommandSpec::new("sleep").arg("30").timeout(Duration::from_millis(50));
    let output = run_command(&spec, CancellationToken::new(), |_, _| {}).await.expect("run");
    assert!(output.timed_out);
    assert!(!output.cancelled);
}

#[tokio::test]
async fn spawn_failure_for_missing_binary_is_an_error() {
    let spec = CommandSpec::new("definitely-not-a-real-binary-xyz");
    let err = run_command(&spec, CancellationToken::new(), |_, _| {}).await.unwrap_err();
    assert!(matches!(err, ShellError::Spawn { .. }));
}
