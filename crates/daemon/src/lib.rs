// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj-daemon`: the long-running process (spec §2, §4 implementation
//! notes). Loads runbooks, drives the Worker Pool and Step Orchestrator,
//! serves the Control/Log API over a length-prefixed IPC socket
//! (`oj-wire`), and owns the process-scoped SSE subscriber table.
//!
//! Binary: `ojd` (`src/main.rs`).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod control;
pub mod lifecycle;
pub mod listener;
pub mod sse_broker;

pub use config::{ConfigError, DaemonConfig};
pub use lifecycle::{Daemon, LifecycleError};
pub use sse_broker::{SseBroker, SseBrokerConfig, SseSubscription, SubscriberId};

pub use oj_wire::{Query, Request, Response};
