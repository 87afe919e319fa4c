// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret-store engine: named secrets with version ids and soft
//! delete.

use std::collections::HashMap;

use lws_config::SecretSpec;
use lws_core::{arn, Clock, EngineError};
use parking_lot::RwLock;
use uuid::Uuid;

/// A stored secret (current version only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub arn: String,
    pub value: String,
    pub version_id: String,
    pub created_ms: u64,
    pub deleted: bool,
}

pub struct SecretStoreEngine<C: Clock> {
    clock: C,
    secrets: RwLock<HashMap<String, Secret>>,
}

impl<C: Clock> SecretStoreEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, secrets: RwLock::new(HashMap::new()) }
    }

    pub fn from_config(specs: &[SecretSpec], clock: C) -> Self {
        let engine = Self::new(clock);
        for spec in specs {
            let _ = engine.create(&spec.name, &spec.value);
        }
        engine
    }

    pub fn create(&self, name: &str, value: &str) -> Result<Secret, EngineError> {
        let mut secrets = self.secrets.write();
        // A soft-deleted secret still reserves its name.
        if secrets.contains_key(name) {
            return Err(EngineError::already_exists("secret", name));
        }
        let secret = Secret {
            name: name.to_string(),
            arn: arn::secret(name, &suffix()),
            value: value.to_string(),
            version_id: Uuid::new_v4().to_string(),
            created_ms: self.clock.epoch_ms(),
            deleted: false,
        };
        secrets.insert(name.to_string(), secret.clone());
        Ok(secret)
    }

    /// Current value by name or arn.
    pub fn get(&self, name_or_arn: &str) -> Result<Secret, EngineError> {
        let secrets = self.secrets.read();
        let secret = secrets
            .values()
            .find(|s| s.name == name_or_arn || s.arn == name_or_arn)
            .filter(|s| !s.deleted)
            .cloned();
        secret.ok_or_else(|| EngineError::not_found("secret", name_or_arn))
    }

    /// Store a new value; returns the secret with its fresh
    /// version id.
    pub fn put_value(&self, name: &str, value: &str) -> Result<Secret, EngineError> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(name)
            .filter(|s| !s.deleted)
            .ok_or_else(|| EngineError::not_found("secret", name))?;
        secret.value = value.to_string();
        secret.version_id = Uuid::new_v4().to_string();
        Ok(secret.clone())
    }

    /// Soft delete: the secret stops resolving but the name stays
    /// reserved, mirroring the recovery window upstream.
    pub fn delete(&self, name: &str) -> Result<u64, EngineError> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(name)
            .filter(|s| !s.deleted)
            .ok_or_else(|| EngineError::not_found("secret", name))?;
        secret.deleted = true;
        Ok(self.clock.epoch_ms())
    }

    pub fn restore(&self, name: &str) -> Result<(), EngineError> {
        let mut secrets = self.secrets.write();
        let secret =
            secrets.get_mut(name).ok_or_else(|| EngineError::not_found("secret", name))?;
        secret.deleted = false;
        Ok(())
    }

    pub fn list(&self) -> Vec<Secret> {
        let mut listed: Vec<Secret> =
            self.secrets.read().values().filter(|s| !s.deleted).cloned().collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        listed
    }
}

fn suffix() -> String {
    Uuid::new_v4().to_string()[..6].to_string()
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
