// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity engine: a local user pool, token issuing, and the policy
//! catalog the auth middleware evaluates.

pub mod policy;
mod token;

pub use policy::{action_matches, evaluate, Decision, EvaluationContext};
pub use token::{Claims, TokenIssuer, TokenSet};

use std::collections::HashMap;

use lws_config::{IdentitySpec, IdentityUserSpec};
use lws_core::{Clock, EngineError};
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

/// A user-pool account.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub sub: String,
    pub password: String,
    pub attributes: HashMap<String, String>,
    pub confirmed: bool,
}

pub struct IdentityEngine<C: Clock> {
    clock: C,
    issuer: TokenIssuer,
    users: RwLock<HashMap<String, User>>,
    /// Auth-middleware identities by name.
    identities: HashMap<String, IdentityUserSpec>,
    /// Resource policies keyed by service.
    resource_policies: HashMap<String, Value>,
}

impl<C: Clock> IdentityEngine<C> {
    pub fn from_config(spec: &IdentitySpec, clock: C) -> Self {
        Self {
            clock,
            issuer: TokenIssuer::new(&spec.user_pool_id, &spec.client_id),
            users: RwLock::new(HashMap::new()),
            identities: spec.identities.iter().map(|i| (i.name.clone(), i.clone())).collect(),
            resource_policies: spec.resource_policies.clone(),
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    // -- User pool ----------------------------------------------------------

    /// Register a user; returns the generated sub.
    pub fn sign_up(
        &self,
        username: &str,
        password: &str,
        attributes: HashMap<String, String>,
    ) -> Result<String, EngineError> {
        let mut users = self.users.write();
        if users.contains_key(username) {
            return Err(EngineError::already_exists("user", username));
        }
        let sub = Uuid::new_v4().to_string();
        users.insert(
            username.to_string(),
            User {
                username: username.to_string(),
                sub: sub.clone(),
                password: password.to_string(),
                attributes,
                confirmed: false,
            },
        );
        Ok(sub)
    }

    pub fn confirm_sign_up(&self, username: &str) -> Result<(), EngineError> {
        let mut users = self.users.write();
        let user = users
            .get_mut(username)
            .ok_or_else(|| EngineError::not_found("user", username))?;
        user.confirmed = true;
        Ok(())
    }

    /// Password authentication; returns a token set.
    pub fn initiate_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenSet, EngineError> {
        let users = self.users.read();
        let user =
            users.get(username).ok_or_else(|| EngineError::not_found("user", username))?;
        if !user.confirmed {
            return Err(EngineError::PermissionDenied(format!(
                "user {username} is not confirmed"
            )));
        }
        if user.password != password {
            return Err(EngineError::PermissionDenied("incorrect username or password".to_string()));
        }
        self.issuer.issue(
            &self.clock,
            &user.sub,
            &user.username,
            user.attributes.get("email").map(String::as_str),
        )
    }

    pub fn get_user(&self, username: &str) -> Result<User, EngineError> {
        self.users
            .read()
            .get(username)
            .cloned()
            .ok_or_else(|| EngineError::not_found("user", username))
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut listed: Vec<User> = self.users.read().values().cloned().collect();
        listed.sort_by(|a, b| a.username.cmp(&b.username));
        listed
    }

    // -- Authorization ------------------------------------------------------

    pub fn known_identity(&self, name: &str) -> bool {
        self.identities.contains_key(name)
    }

    /// Evaluate an identity against required actions for a service.
    /// Unknown identities deny outright.
    pub fn authorize(
        &self,
        identity_name: &str,
        service: &str,
        actions: &[String],
    ) -> (Decision, String) {
        let Some(identity) = self.identities.get(identity_name) else {
            return (Decision::Deny, format!("unknown identity {identity_name}"));
        };
        let ctx = EvaluationContext {
            actions,
            identity_policies: &identity.policies,
            boundary: identity.boundary.as_ref(),
            resource_policy: self.resource_policies.get(service),
        };
        evaluate(&ctx)
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
