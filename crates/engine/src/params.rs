// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter-store engine: versioned name/value pairs with path-style
//! listing.

use std::collections::HashMap;

use lws_config::ParameterSpec;
use lws_core::{arn, Clock, EngineError};
use parking_lot::RwLock;

/// A stored parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub arn: String,
    pub value: String,
    pub secure: bool,
    pub version: u64,
    pub last_modified_ms: u64,
}

impl Parameter {
    pub fn type_name(&self) -> &'static str {
        if self.secure {
            "SecureString"
        } else {
            "String"
        }
    }
}

pub struct ParameterStoreEngine<C: Clock> {
    clock: C,
    parameters: RwLock<HashMap<String, Parameter>>,
}

impl<C: Clock> ParameterStoreEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, parameters: RwLock::new(HashMap::new()) }
    }

    pub fn from_config(specs: &[ParameterSpec], clock: C) -> Self {
        let engine = Self::new(clock);
        for spec in specs {
            let _ = engine.put(&spec.name, &spec.value, spec.secure, true);
        }
        engine
    }

    /// Create or overwrite; returns the new version. Overwriting
    /// requires `overwrite`, as on the real service.
    pub fn put(
        &self,
        name: &str,
        value: &str,
        secure: bool,
        overwrite: bool,
    ) -> Result<u64, EngineError> {
        let mut parameters = self.parameters.write();
        let version = match parameters.get(name) {
            Some(existing) => {
                if !overwrite {
                    return Err(EngineError::already_exists("parameter", name));
                }
                existing.version + 1
            }
            None => 1,
        };
        parameters.insert(
            name.to_string(),
            Parameter {
                name: name.to_string(),
                arn: arn::parameter(name),
                value: value.to_string(),
                secure,
                version,
                last_modified_ms: self.clock.epoch_ms(),
            },
        );
        Ok(version)
    }

    pub fn get(&self, name: &str) -> Result<Parameter, EngineError> {
        self.parameters
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::not_found("parameter", name))
    }

    pub fn delete(&self, name: &str) -> Result<(), EngineError> {
        match self.parameters.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("parameter", name)),
        }
    }

    /// Parameters under a path prefix, sorted by name. Non-recursive
    /// listing stops at the next `/`.
    pub fn get_by_path(&self, path: &str, recursive: bool) -> Vec<Parameter> {
        let prefix = if path.ends_with('/') { path.to_string() } else { format!("{path}/") };
        let mut found: Vec<Parameter> = self
            .parameters
            .read()
            .values()
            .filter(|p| {
                let Some(rest) = p.name.strip_prefix(&prefix) else {
                    return false;
                };
                recursive || !rest.contains('/')
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.parameters.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
