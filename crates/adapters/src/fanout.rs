// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared poll-to-completion loop for fan-out managers (spec §4.5):
//! create N children, then wait for every one to reach a terminal
//! status with a bounded overall timeout and a small polling interval.

use std::time::{Duration, Instant};

use oj_core::{JobId, JobStatus, OjError};
use tokio_util::sync::CancellationToken;

use crate::AdapterError;

/// Poll `children` until every one is terminal, or `timeout` elapses, or
/// `cancel` fires. On any child failure, fails the whole step (spec
/// §4.5: "On any child failure, fail the step").
pub async fn wait_for_children(
    step_name: &str,
    children: &[JobId],
    jobs: &dyn crate::JobHandle,
    cancel: &CancellationToken,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), AdapterError> {
    let start = Instant::now();
    loop {
        let mut pending = 0usize;
        let mut failed = 0usize;
        for child in children {
            match jobs.get_job_status(child).await? {
                JobStatus::Completed => {}
                JobStatus::Failed | JobStatus::Cancelled => failed += 1,
                JobStatus::Pending | JobStatus::Running => pending += 1,
            }
        }

        if pending == 0 {
            return if failed == 0 {
                Ok(())
            } else {
                Err(AdapterError::FanOutFailed { step: step_name.to_string(), child_count: children.len(), failed })
            };
        }

        if start.elapsed() >= timeout {
            return Err(AdapterError::FanOutTimeout {
                step: step_name.to_string(),
                elapsed: start.elapsed(),
                pending,
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(AdapterError::Core(OjError::cancelled(format!(
                    "step {step_name} cancelled while waiting on {pending} child job(s)"
                ))));
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
