// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::Value;
use thiserror::Error;

use crate::action::{ActionKind, UnknownActionError};
use crate::hcl_model::RunbookDocument;

/// A single named job from a runbook document.
///
/// This is the Orchestrator's recipe (spec §4.6): an ordered list of
/// `steps` it walks to create child jobs/Step Manager invocations. It is
/// not itself a running job — `oj-core::Job` is.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDefinition {
    pub name: String,
    pub job_type: String,
    pub schedule: Option<String>,
    pub source_type: Option<String>,
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
}

/// One step in a job definition's ordered pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub action: ActionKind,
    /// Action-specific configuration. Kept schemaless at this layer —
    /// the Step Manager for `action` is responsible for validating it.
    pub config: Value,
}

#[derive(Debug, Error)]
pub enum RunbookError {
    #[error("failed to parse HCL: {0}")]
    Hcl(#[from] hcl::Error),
    #[error("job \"{job}\", step \"{step}\": {source}")]
    UnknownAction { job: String, step: String, #[source] source: UnknownActionError },
    #[error("job \"{job}\", step \"{step}\": config block is not representable as JSON: {source}")]
    Config { job: String, step: String, #[source] source: serde_json::Error },
}

pub(crate) fn parse(source: &str) -> Result<Vec<JobDefinition>, RunbookError> {
    let doc: RunbookDocument = hcl::from_str(source)?;
    doc.jobs
        .into_iter()
        .map(|(job_name, body)| {
            let steps = body
                .steps
                .into_iter()
                .map(|(step_name, step_body)| {
                    let action = step_body.action.parse::<ActionKind>().map_err(|source| {
                        RunbookError::UnknownAction { job: job_name.clone(), step: step_name.clone(), source }
                    })?;
                    let config = match step_body.config {
                        Some(v) => serde_json::to_value(v).map_err(|source| RunbookError::Config {
                            job: job_name.clone(),
                            step: step_name.clone(),
                            source,
                        })?,
                        None => Value::Object(serde_json::Map::new()),
                    };
                    Ok(Step { name: step_name, action, config })
                })
                .collect::<Result<Vec<_>, RunbookError>>()?;

            Ok(JobDefinition {
                name: job_name,
                job_type: body.job_type,
                schedule: body.schedule,
                source_type: body.source_type,
                tags: body.tags,
                steps,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "job_definition_tests.rs"]
mod tests;
