// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lws-config: the resolved configuration document.
//!
//! An out-of-scope loader (template parser, CLI) produces this
//! document; the emulator core consumes it. Parsed from TOML or JSON
//! and validated before any engine starts. Validation is the point
//! where dead-letter chains are proven acyclic and resource references
//! are proven resolvable.

mod error;
mod model;
mod validate;

pub use error::ConfigError;
pub use model::{
    default_port, SERVICES, BucketNotificationSpec, BucketSpec, BusSpec, EmulatorConfig,
    EventSourceKind, EventSourceMappingSpec, FunctionSpec, GlobalOptions, IdentitySpec,
    IdentityUserSpec, KeyAttributeSpec, ParameterSpec, QueueSpec, RedrivePolicySpec,
    RuleSpec, SecretSpec, ServiceSettings, StateMachineSpec, StreamView, SubscriptionSpec,
    TableIndexSpec, TableSpec, TopicSpec, WorkflowType,
};
pub use validate::validate;

/// Parse and validate a TOML configuration document.
pub fn from_toml(input: &str) -> Result<EmulatorConfig, ConfigError> {
    let config: EmulatorConfig =
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Parse and validate a JSON configuration document.
pub fn from_json(input: &str) -> Result<EmulatorConfig, ConfigError> {
    let config: EmulatorConfig =
        serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}
