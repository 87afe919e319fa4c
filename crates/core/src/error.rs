// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level error taxonomy.
//!
//! Every service engine returns [`EngineError`]; protocol adapters
//! translate it to the service's native wire code and HTTP status.

use thiserror::Error;

/// Per-item outcome of a canceled transactional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationReason {
    /// The operation would have succeeded.
    None,
    /// The operation's condition expression evaluated false.
    ConditionalCheckFailed,
}

impl CancellationReason {
    pub fn code(&self) -> &'static str {
        match self {
            CancellationReason::None => "None",
            CancellationReason::ConditionalCheckFailed => "ConditionalCheckFailed",
        }
    }
}

/// Errors produced by service engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{resource} not found: {name}")]
    NotFound { resource: &'static str, name: String },

    #[error("{resource} already exists: {name}")]
    AlreadyExists { resource: &'static str, name: String },

    #[error("{0}")]
    Validation(String),

    #[error("conditional check failed: {0}")]
    ConditionFailed(String),

    #[error("transaction canceled")]
    TransactionCanceled { reasons: Vec<CancellationReason> },

    #[error("request throttled: {0}")]
    Throttled(String),

    #[error("access denied: {0}")]
    PermissionDenied(String),

    #[error("deadline exceeded: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn not_found(resource: &'static str, name: impl Into<String>) -> Self {
        EngineError::NotFound { resource, name: name.into() }
    }

    pub fn already_exists(resource: &'static str, name: impl Into<String>) -> Self {
        EngineError::AlreadyExists { resource, name: name.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    /// True when the error reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
