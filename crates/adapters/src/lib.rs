// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj-adapters`: Step Manager implementations (spec §4.5).
//!
//! One manager per action, registered by `Step::action` in a
//! `StepManagerRegistry`. A manager either runs its step inline
//! (synchronous managers: `reindex`, `transform`, `places_search`) or
//! creates a fan-out of child jobs and polls them to completion
//! (`crawl`, `agent`/`classify`/`summarize`).
//!
//! Managers never touch the Queue Store directly — they're handed a
//! `&dyn JobHandle` by the Orchestrator (`oj-engine::JobManager`
//! implements it), which keeps this crate free of a dependency on
//! `oj-engine` (which depends on this crate for dispatch).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod agent;
mod crawl;
mod error;
mod fanout;
mod job_handle;
#[cfg(test)]
mod mock;
mod places_search;
mod reindex;
mod registry;
mod transform;

pub use agent::AgentManager;
pub use crawl::CrawlManager;
pub use error::AdapterError;
pub use job_handle::JobHandle;
pub use places_search::PlacesSearchManager;
pub use reindex::ReindexManager;
pub use registry::StepManagerRegistry;
pub use transform::TransformManager;

use async_trait::async_trait;
use oj_core::JobId;
use oj_runbook::Step;
use tokio_util::sync::CancellationToken;

/// Contract every Step Manager implements (spec §4.5).
#[async_trait]
pub trait StepManager: Send + Sync {
    /// Routes dispatch: matched against `Step::action.as_str()` in the
    /// registry.
    fn manager_type(&self) -> &'static str;

    /// Whether this manager fans out to child jobs the Orchestrator must
    /// poll for completion, or runs synchronously and returns only once
    /// the step's own job is already terminal.
    fn returns_child_jobs(&self) -> bool;

    /// Execute `step` as a child of `parent_job_id`, returning the id of
    /// the job record created to represent this step's execution.
    async fn create_parent_job(
        &self,
        step: &Step,
        parent_job_id: JobId,
        jobs: &dyn JobHandle,
        cancel: CancellationToken,
    ) -> Result<JobId, AdapterError>;
}

/// Default overall wait for a fan-out manager's children to reach a
/// terminal state (spec §4.5, §5: "default 10 min").
pub const DEFAULT_FANOUT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(600);

/// Default polling interval between child-status checks (spec §4.5:
/// "small polling interval (e.g. 5 s)").
pub const DEFAULT_FANOUT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
