// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core error taxonomy.
//!
//! Maps onto the error-handling design one-to-one: not-found, validation,
//! precondition, cancellation, transient I/O, timeout, and a fatal
//! invariant-violation case that should never be hit outside a bug.

use std::time::Duration;
use thiserror::Error;

/// The error type returned by every `oj-core`/`oj-storage` contract.
#[derive(Debug, Error)]
pub enum OjError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Invariant violation. Per the error-handling design, the affected
    /// workflow should be logged and terminated rather than silently
    /// recovered from.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl OjError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        OjError::NotFound(what.to_string())
    }

    pub fn validation(msg: impl std::fmt::Display) -> Self {
        OjError::Validation(msg.to_string())
    }

    pub fn precondition(msg: impl std::fmt::Display) -> Self {
        OjError::Precondition(msg.to_string())
    }

    pub fn cancelled(msg: impl std::fmt::Display) -> Self {
        OjError::Cancelled(msg.to_string())
    }

    pub fn invariant(msg: impl std::fmt::Display) -> Self {
        OjError::Invariant(msg.to_string())
    }

    /// True for `NotFound`, used to map onto the sentinel `ErrJobNotFound`
    /// behavior callers are expected to match on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OjError::NotFound(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, OjError::Io(_) | OjError::Timeout(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
