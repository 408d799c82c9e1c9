// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime error taxonomy: the core's `OjError` plus the adapter-layer
//! failures a Step Manager can produce.

use oj_adapters::AdapterError;
use oj_core::OjError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] OjError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("unknown step action \"{0}\"")]
    UnknownAction(String),
}

impl RuntimeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::Core(e) if e.is_not_found())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
