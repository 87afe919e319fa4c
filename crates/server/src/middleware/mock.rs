// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation-level mocking.
//!
//! First rule whose operation and header filters match short-circuits
//! the chain with a canned response, before auth and chaos ever see
//! the request.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::extract::ExtractedOperation;
use crate::state::ServerState;

/// Mock configuration for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    pub service: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub rules: Vec<MockRule>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockRule {
    /// Kebab-case operation name (`get-item`).
    pub operation: String,
    #[serde(rename = "match", default)]
    pub match_filters: MatchFilters,
    #[serde(default)]
    pub response: MockResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchFilters {
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub delay_ms: u64,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: default_status(),
            headers: HashMap::new(),
            body: None,
            content_type: default_content_type(),
            delay_ms: 0,
        }
    }
}

fn default_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Per-service mock configurations, updated through the control plane.
#[derive(Default)]
pub struct MockStore {
    configs: RwLock<HashMap<String, MockConfig>>,
}

impl MockStore {
    pub fn set(&self, config: MockConfig) {
        self.configs.write().insert(config.service.clone(), config);
    }

    pub fn set_enabled(&self, service: &str, enabled: bool) -> bool {
        match self.configs.write().get_mut(service) {
            Some(config) => {
                config.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, service: &str) -> Option<MockConfig> {
        self.configs.read().get(service).cloned()
    }

    pub fn all(&self) -> HashMap<String, MockConfig> {
        self.configs.read().clone()
    }
}

pub async fn layer(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    if super::is_management(request.uri().path()) {
        return next.run(request).await;
    }
    let Some(config) = state.mocks.get(state.service).filter(|c| c.enabled) else {
        return next.run(request).await;
    };
    let operation = request
        .extensions()
        .get::<ExtractedOperation>()
        .and_then(|op| op.0.clone());
    let Some(operation) = operation else {
        return next.run(request).await;
    };

    let matched = config.rules.iter().find(|rule| {
        rule.operation == operation
            && rule.match_filters.headers.iter().all(|(name, expected)| {
                request
                    .headers()
                    .get(name.to_ascii_lowercase())
                    .and_then(|v| v.to_str().ok())
                    == Some(expected.as_str())
            })
    });
    match matched {
        Some(rule) => {
            tracing::debug!(service = %state.service, operation = %operation, "mock rule hit");
            build_response(&rule.response).await
        }
        None => next.run(request).await,
    }
}

async fn build_response(mock: &MockResponse) -> Response {
    if mock.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(mock.delay_ms)).await;
    }
    let body = match &mock.body {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(value) => value.to_string(),
        None => String::new(),
    };
    let mut builder = Response::builder()
        .status(StatusCode::from_u16(mock.status).unwrap_or(StatusCode::OK))
        .header("content-type", mock.content_type.clone());
    for (name, value) in &mock.headers {
        if let (Ok(name), Ok(value)) =
            (name.parse::<HeaderName>(), value.parse::<HeaderValue>())
        {
            builder = builder.header(name, value);
        }
    }
    builder.body(Body::from(body)).unwrap_or_else(|_| {
        Response::new(Body::from("mock response construction failed"))
    })
}
