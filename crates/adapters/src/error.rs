// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use oj_core::OjError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Core(#[from] OjError),

    #[error("step config for action \"{action}\" is invalid: {reason}")]
    InvalidConfig { action: &'static str, reason: String },

    #[error("step \"{step}\": {failed} of {child_count} children failed")]
    FanOutFailed { step: String, child_count: usize, failed: usize },

    #[error("step \"{step}\": timed out after {elapsed:?} waiting for {pending} child job(s)")]
    FanOutTimeout { step: String, elapsed: std::time::Duration, pending: usize },

    #[error("shell command failed for step \"{step}\": {source}")]
    Shell { step: String, #[source] source: oj_shell::ShellError },
}
