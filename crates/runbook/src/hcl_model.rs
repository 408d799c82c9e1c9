// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serde model mirroring the HCL shape of a runbook document. Kept
//! separate from the public types in `job_definition.rs` so the public
//! API doesn't leak hcl-rs's label-as-map-key representation.

use indexmap::IndexMap;
use serde::Deserialize;

/// Top-level document: one or more labeled `job "name" { ... }` blocks.
#[derive(Debug, Deserialize)]
pub struct RunbookDocument {
    #[serde(default, rename = "job")]
    pub jobs: IndexMap<String, JobBody>,
}

#[derive(Debug, Deserialize)]
pub struct JobBody {
    #[serde(rename = "type")]
    pub job_type: String,
    pub schedule: Option<String>,
    pub source_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "step")]
    pub steps: IndexMap<String, StepBody>,
}

#[derive(Debug, Deserialize)]
pub struct StepBody {
    pub action: String,
    pub config: Option<hcl::Value>,
}

#[cfg(test)]
#[path = "hcl_model_tests.rs"]
mod tests;
