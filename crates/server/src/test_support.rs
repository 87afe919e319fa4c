// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for adapter and middleware tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use lws_config::EmulatorConfig;
use lws_engine::RecordingRunner;
use serde_json::Value;
use tower::ServiceExt;

use crate::state::ServerState;
use crate::supervisor::build_engines;

/// Build server state over fresh engines with a recording runner.
pub fn test_state(config: EmulatorConfig) -> (ServerState, Arc<RecordingRunner>) {
    let runner = RecordingRunner::new();
    let engines = match build_engines(&config, runner.clone()) {
        Ok(engines) => Arc::new(engines),
        Err(err) => panic!("engine setup failed: {err}"),
    };
    (ServerState::new(engines, Arc::new(config)), runner)
}

/// Parse a TOML config document for a test fixture.
pub fn config(toml: &str) -> EmulatorConfig {
    lws_config::from_toml(toml).unwrap()
}

/// A JSON-dialect request with an `X-Amz-Target` header.
pub fn target_request(target: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("x-amz-target", target)
        .header("content-type", "application/x-amz-json-1.0")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A form-dialect request.
pub fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Run one request through a router.
pub async fn call(router: Router, request: Request<Body>) -> Response {
    router.oneshot(request).await.unwrap()
}

/// Collect a response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Collect a response, asserting the status, as JSON.
pub async fn body_json(response: Response, expected: StatusCode) -> Value {
    assert_eq!(response.status(), expected, "unexpected status");
    let text = body_text(response).await;
    serde_json::from_str(&text).unwrap_or_else(|_| panic!("not JSON: {text}"))
}
