// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process wiring: opens the Queue Store and Log Store, builds the Job
//! Manager / Worker Pool / Step Orchestrator / Log Service / Event Bus /
//! SSE Broker, discovers runbooks, and spawns the daemon's background
//! tasks (spec §2 data flow, §4 implementation notes).

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use oj_adapters::StepManagerRegistry;
use oj_core::{Event, JobId, OjError, SystemClock};
use oj_engine::{EventBus, JobManager, LogService, Orchestrator, WorkerPool};
use oj_runbook::JobDefinition;
use oj_storage::{LogStore, QueueStore, WalError};
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::control::ControlContext;
use crate::sse_broker::{SseBroker, SseBrokerConfig};
use crate::DaemonConfig;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("opening queue store WAL: {0}")]
    Wal(#[from] WalError),
    #[error("discovering runbooks in {dir}: {source}")]
    Runbook { dir: PathBuf, #[source] source: oj_runbook::discover::DiscoverError },
}

/// The fully wired daemon: every long-running component plus the
/// background tasks driving them. Constructed once at startup, shared
/// behind an `Arc` with the listener.
pub struct Daemon {
    pub config: DaemonConfig,
    pub jobs: Arc<JobManager<SystemClock>>,
    pub log_service: Arc<LogService<SystemClock>>,
    pub orchestrator: Arc<Orchestrator<SystemClock>>,
    pub broker: Arc<SseBroker<SystemClock>>,
    pub events: Arc<EventBus>,
    pub runbooks: Vec<JobDefinition>,
    started_at: std::time::Instant,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Daemon {
    /// Open durable state under `config.state_dir`/`config.log_dir`,
    /// replaying the WAL (spec §4.2: "Queue Store... event-sourced...
    /// built by replaying an append-only WAL") and rebuilding the Log
    /// Store's in-memory index from its segment files, then spawn the
    /// Worker Pool's dispatch loop and the SSE Broker's batching tick.
    pub async fn start(config: DaemonConfig, runbook_dir: Option<PathBuf>) -> Result<Arc<Self>, LifecycleError> {
        let clock = SystemClock;
        let wal_path = config.state_dir.join("wal.jsonl");
        let queue = Arc::new(QueueStore::open(wal_path, clock.clone())?);
        let logs = Arc::new(LogStore::new(config.log_dir.clone()));
        let events = Arc::new(EventBus::with_buffer(config.subscriber_buffer));

        let jobs = Arc::new(JobManager::new(Arc::clone(&queue), Arc::clone(&logs), Arc::clone(&events), clock.clone()));
        let log_service = Arc::new(LogService::new(Arc::clone(&queue), Arc::clone(&logs)));

        let worker_pool = Arc::new(
            WorkerPool::new(Arc::clone(&queue), Arc::clone(&events), clock.clone())
                .with_concurrency(config.worker_concurrency)
                .with_poll_interval(config.worker_poll_interval()),
        );

        let registry = Arc::new(StepManagerRegistry::with_default_managers());
        let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&jobs), registry));

        let broker = Arc::new(SseBroker::new(
            clock,
            SseBrokerConfig {
                buffer: config.subscriber_buffer,
                backoff_ladder_ms: config.sse_backoff_ladder_ms.clone(),
                escalate_threshold: config.sse_escalate_threshold,
                deescalate_threshold: config.sse_deescalate_threshold,
                heartbeat_ms: config.sse_heartbeat_secs * 1_000,
            },
        ));

        let runbooks = match &runbook_dir {
            Some(dir) => oj_runbook::discover_runbooks(dir)
                .map_err(|source| LifecycleError::Runbook { dir: dir.clone(), source })?,
            None => Vec::new(),
        };
        info!(count = runbooks.len(), "discovered job definitions");

        let shutdown = CancellationToken::new();
        let mut tasks = Vec::new();

        tasks.push(tokio::spawn({
            let pool = Arc::clone(&worker_pool);
            let shutdown = shutdown.clone();
            async move { pool.run(shutdown).await }
        }));

        tasks.push(tokio::spawn(run_sse_ticker(Arc::clone(&broker), shutdown.clone())));
        tasks.push(tokio::spawn(forward_events_to_broker(events.subscribe(), Arc::clone(&broker), shutdown.clone())));

        Ok(Arc::new(Self {
            config,
            jobs,
            log_service,
            orchestrator,
            broker,
            events,
            runbooks,
            started_at: std::time::Instant::now(),
            shutdown,
            tasks: Mutex::new(tasks),
        }))
    }

    pub fn control_context(&self) -> ControlContext<SystemClock> {
        ControlContext { jobs: Arc::clone(&self.jobs), logs: Arc::clone(&self.log_service), started_at: self.started_at }
    }

    /// Run a discovered job definition by name as a new workflow
    /// instance, in the background (spec §2: "an external caller...
    /// triggers a run"). Returns once the definition has been found and
    /// the run has been spawned — not once the run completes, matching
    /// §5's "the Orchestrator's per-workflow driver is a single logical
    /// thread that may block on polling child status" being a property
    /// of that background task, not of this call.
    pub fn spawn_run(self: &Arc<Self>, definition_name: &str, payload: Value) -> Result<(), OjError> {
        let definition = self
            .runbooks
            .iter()
            .find(|d| d.name == definition_name)
            .cloned()
            .ok_or_else(|| OjError::not_found(format!("job definition {definition_name}")))?;
        let daemon = Arc::clone(self);
        let cancel = self.shutdown.child_token();
        self.tasks.lock().push(tokio::spawn(async move {
            if let Err(err) = daemon.orchestrator.run(&definition, payload, cancel).await {
                warn!(definition = %definition.name, %err, "workflow run ended in error");
            }
        }));
        Ok(())
    }

    /// Request an orderly shutdown: stop accepting new work, let the
    /// Worker Pool and any running workflow drivers drain, then await
    /// every background task.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
    }
}

/// Drives the SSE Broker's adaptive batching and heartbeat (spec §6) on
/// a short fixed tick; the broker itself decides, per subscriber,
/// whether enough time has passed to flush.
async fn run_sse_ticker(broker: Arc<SseBroker<SystemClock>>, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(100));
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = interval.tick() => broker.tick(),
        }
    }
}

/// Bridges the Event Bus to the SSE Broker: every `LogAppended` becomes a
/// batched log delta, every status-changing event becomes an immediate
/// `status` flush (spec §4 implementation notes: "SSE Broker... per-
/// subscriber channel... pairs with the Event Bus").
async fn forward_events_to_broker(
    mut events: tokio::sync::mpsc::Receiver<Event>,
    broker: Arc<SseBroker<SystemClock>>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => return,
            event = events.recv() => match event {
                Some(event) => event,
                None => return,
            },
        };
        match event {
            Event::LogAppended { entry } => broker.notify_log(entry, None),
            Event::JobStarted { job_id, .. } => notify(&broker, job_id, oj_core::JobStatus::Running, None),
            Event::JobCompleted { job_id, .. } => notify(&broker, job_id, oj_core::JobStatus::Completed, None),
            Event::JobFailed { job_id, .. } => notify(&broker, job_id, oj_core::JobStatus::Failed, None),
            Event::JobCancelled { job_id, .. } => notify(&broker, job_id, oj_core::JobStatus::Cancelled, None),
            Event::StepStarted { job_id, step_name, .. } => {
                notify(&broker, job_id, oj_core::JobStatus::Running, Some(step_name))
            }
            _ => {}
        }
    }
}

fn notify(broker: &SseBroker<SystemClock>, job_id: JobId, status: oj_core::JobStatus, step_name: Option<String>) {
    broker.notify_status(job_id, status, step_name);
}

/// Resolve the contributing job set for a `GET /logs/stream` subscribe
/// request exactly as the Log Service does for a one-shot read (spec
/// §4.3's `contributing_jobs`, reused here so a live subscription and a
/// paginated read agree on scope).
pub fn contributing_jobs(jobs: &JobManager<SystemClock>, job_id: &JobId, include_children: bool) -> HashSet<JobId> {
    if !include_children {
        return std::iter::once(*job_id).collect();
    }
    let mut set: HashSet<JobId> = jobs.queue().descendants_of(job_id).into_iter().collect();
    set.insert(*job_id);
    set
}
