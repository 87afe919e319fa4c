// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use crate::supervisor::service_router;
use crate::test_support::{body_json, call, config, test_state};

const FIXTURE: &str = r#"
[[queues]]
name = "orders"

[[tables]]
name = "users"
[tables.partition_key]
name = "id"

[[buckets]]
name = "assets"

[services.sns]
enabled = false
"#;

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn resources_lists_enabled_services_with_inventory() {
    let (state, _) = test_state(config(FIXTURE));
    let router = service_router("sqs", &state);
    let body = body_json(call(router, get("/_lws/resources")).await, StatusCode::OK).await;

    let services = body["services"].as_array().unwrap();
    let sqs = services.iter().find(|s| s["service"] == "sqs").unwrap();
    assert_eq!(sqs["resources"][0], "orders");
    assert_eq!(sqs["port"], 4576);

    let dynamodb = services.iter().find(|s| s["service"] == "dynamodb").unwrap();
    assert_eq!(dynamodb["resources"][0], "users");

    // Disabled services are absent from the inventory.
    assert!(!services.iter().any(|s| s["service"] == "sns"));
}

#[tokio::test]
async fn chaos_config_round_trips() {
    let (state, _) = test_state(config(""));
    let router = service_router("sqs", &state);

    let set = post(
        "/_lws/chaos",
        json!({
            "sqs": {"enabled": true, "error_rate": 0.5, "latency_min_ms": 10, "latency_max_ms": 20}
        }),
    );
    assert_eq!(call(router.clone(), set).await.status(), StatusCode::OK);

    let body = body_json(call(router, get("/_lws/chaos")).await, StatusCode::OK).await;
    assert_eq!(body["sqs"]["enabled"], true);
    assert_eq!(body["sqs"]["error_rate"], 0.5);
    assert_eq!(body["sqs"]["latency_max_ms"], 20);
}

#[tokio::test]
async fn mock_config_round_trips() {
    let (state, _) = test_state(config(""));
    let router = service_router("sqs", &state);

    let set = post(
        "/_lws/aws-mock",
        json!({
            "service": "sqs",
            "enabled": true,
            "rules": [{
                "operation": "send-message",
                "response": {"status": 500, "body": {"__type": "InternalServerError"}},
            }],
        }),
    );
    assert_eq!(call(router.clone(), set).await.status(), StatusCode::OK);

    let body = body_json(call(router, get("/_lws/aws-mock")).await, StatusCode::OK).await;
    assert_eq!(body["sqs"]["rules"][0]["operation"], "send-message");
    assert_eq!(body["sqs"]["rules"][0]["response"]["status"], 500);
}
