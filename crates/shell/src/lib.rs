// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj-shell`: local command execution helper.
//!
//! Synchronous Step Managers (e.g. `transform`, `reindex`) shell out to
//! external tools (pandoc, a search-index CLI, …) rather than
//! reimplementing them in-process. This crate is the one place that
//! knows how to run such a command: capture stdout/stderr line-by-line
//! (for log forwarding), honor a cancellation token at the only
//! suspension point that matters (the child process's exit), and enforce
//! a wall-clock timeout.
//!
//! This is deliberately not a shell *language* — no lexer, parser, or
//! word-splitting. Callers pass `program` + `args` directly, exactly as
//! `std::process::Command` / `tokio::process::Command` would.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod run;

pub use run::{run_command, CommandOutput, CommandSpec, ShellError};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
