// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runbook file discovery: walk a directory tree for `.hcl` files and
//! parse each into its job definitions.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::job_definition::{JobDefinition, RunbookError};

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("reading runbook directory {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("parsing runbook {path}: {source}")]
    Parse { path: PathBuf, #[source] source: RunbookError },
}

/// Recursively find every `.hcl` file under `dir` and parse it, returning
/// all job definitions found across all files. Job names must be unique
/// across the whole directory; a duplicate is a parse-time surprise the
/// caller would rather see here than at schedule time.
pub fn discover_runbooks(dir: &Path) -> Result<Vec<JobDefinition>, DiscoverError> {
    let mut defs = Vec::new();
    for path in collect_hcl_files(dir)? {
        let content = std::fs::read_to_string(&path)
            .map_err(|source| DiscoverError::Io { path: path.clone(), source })?;
        let parsed = crate::parse_str(&content)
            .map_err(|source| DiscoverError::Parse { path: path.clone(), source })?;
        defs.extend(parsed);
    }
    Ok(defs)
}

fn collect_hcl_files(dir: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = std::fs::read_dir(&current)
            .map_err(|source| DiscoverError::Io { path: current.clone(), source })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("hcl") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
