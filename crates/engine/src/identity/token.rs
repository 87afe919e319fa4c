// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token issuing for the local user pool.
//!
//! HS256 with an ephemeral per-pool key. Tokens expire after an hour;
//! the issuer url mimics the upstream shape so SDK-side parsing works.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lws_core::{arn, Clock, EngineError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_EXPIRY_SECS: u64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(rename = "cognito:username")]
    pub username: String,
    pub iss: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: u64,
    pub iat: u64,
    pub token_use: String,
}

/// The three tokens an authentication hands back.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

pub struct TokenIssuer {
    issuer: String,
    client_id: String,
    key: Vec<u8>,
}

impl TokenIssuer {
    pub fn new(user_pool_id: &str, client_id: &str) -> Self {
        // Ephemeral signing key; tokens do not survive a restart.
        let mut key = Vec::with_capacity(32);
        key.extend_from_slice(Uuid::new_v4().as_bytes());
        key.extend_from_slice(Uuid::new_v4().as_bytes());
        Self {
            issuer: format!(
                "https://cognito-idp.{}.amazonaws.com/{user_pool_id}",
                arn::REGION
            ),
            client_id: client_id.to_string(),
            key,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn issue<C: Clock>(
        &self,
        clock: &C,
        sub: &str,
        username: &str,
        email: Option<&str>,
    ) -> Result<TokenSet, EngineError> {
        let now = clock.epoch_ms() / 1000;
        let id_claims = Claims {
            sub: sub.to_string(),
            username: username.to_string(),
            iss: self.issuer.clone(),
            aud: Some(self.client_id.clone()),
            client_id: None,
            scope: None,
            email: email.map(str::to_string),
            exp: now + TOKEN_EXPIRY_SECS,
            iat: now,
            token_use: "id".to_string(),
        };
        let access_claims = Claims {
            sub: sub.to_string(),
            username: username.to_string(),
            iss: self.issuer.clone(),
            aud: None,
            client_id: Some(self.client_id.clone()),
            scope: Some("aws.cognito.signin.user.admin".to_string()),
            email: None,
            exp: now + TOKEN_EXPIRY_SECS,
            iat: now,
            token_use: "access".to_string(),
        };
        Ok(TokenSet {
            id_token: self.sign(&id_claims)?,
            access_token: self.sign(&access_claims)?,
            refresh_token: Uuid::new_v4().to_string(),
            expires_in: TOKEN_EXPIRY_SECS,
        })
    }

    /// Validate a token's signature, expiry, and issuer; audience is
    /// checked for id tokens only.
    pub fn decode(&self, token: &str, token_use: &str) -> Result<Claims, EngineError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        if token_use == "id" {
            validation.set_audience(&[&self.client_id]);
        } else {
            validation.validate_aud = false;
        }
        let data = decode::<Claims>(token, &DecodingKey::from_secret(&self.key), &validation)
            .map_err(|e| EngineError::validation(format!("invalid token: {e}")))?;
        if data.claims.token_use != token_use {
            return Err(EngineError::validation(format!(
                "expected a {token_use} token, got {}",
                data.claims.token_use
            )));
        }
        Ok(data.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, EngineError> {
        encode(&Header::default(), claims, &EncodingKey::from_secret(&self.key))
            .map_err(|e| EngineError::Internal(format!("token signing failed: {e}")))
    }
}
