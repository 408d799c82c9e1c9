// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! oj-storage: durable Queue Store and Log Store (spec §4.1, §4.2).
//!
//! State is event-sourced: `MaterializedState` is derived entirely by
//! folding `oj_core::Event`s over an append-only WAL. A separate
//! `LogStore` persists per-job log streams as JSONL segment files,
//! independent of the WAL (log volume is far higher than job-event
//! volume and doesn't need replay semantics — it's append-only and
//! read-indexed directly).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod log_store;
pub mod queue_store;
pub mod snapshot;
pub mod state;
pub mod wal;

pub use log_store::{LogStore, LogStoreError};
pub use queue_store::QueueStore;
pub use snapshot::{Snapshot, SnapshotError};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError};
