// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors raised while parsing or validating a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid {location}: {message}")]
    Invalid { location: String, message: String },

    #[error("duplicate {resource} name: {name}")]
    Duplicate { resource: &'static str, name: String },

    #[error("{location} references unknown {resource} '{name}'")]
    UnknownReference { location: String, resource: &'static str, name: String },

    #[error("dead-letter chain cycles through queue '{0}'")]
    RedriveCycle(String),
}

impl ConfigError {
    pub fn invalid(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid { location: location.into(), message: message.into() }
    }
}
