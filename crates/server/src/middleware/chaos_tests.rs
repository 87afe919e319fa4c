// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use serde_json::json;

use super::chaos::{ChaosConfig, ChaosErrorSpec};
use crate::supervisor::service_router;
use crate::test_support::{body_json, body_text, call, config, target_request, test_state};

fn certain_error(error_type: &str, status_code: Option<u16>) -> ChaosConfig {
    ChaosConfig {
        enabled: true,
        error_rate: 1.0,
        errors: vec![ChaosErrorSpec {
            error_type: error_type.to_string(),
            message: "chaos: injected error".to_string(),
            weight: 1.0,
            status_code,
        }],
        ..ChaosConfig::default()
    }
}

#[tokio::test]
async fn full_error_rate_answers_in_native_json_format() {
    let (state, _) = test_state(config(""));
    state.chaos.set("dynamodb", certain_error("ThrottlingException", None));
    let router = service_router("dynamodb", &state);

    let error = body_json(
        call(router, target_request("DynamoDB_20120810.Scan", json!({"TableName": "t"}))).await,
        StatusCode::TOO_MANY_REQUESTS,
    )
    .await;
    assert_eq!(error["__type"], "ThrottlingException");
    assert_eq!(error["message"], "chaos: injected error");
}

#[tokio::test]
async fn object_store_chaos_answers_in_xml() {
    let (state, _) = test_state(config("[[buckets]]\nname = \"b\"\n"));
    state.chaos.set("s3", certain_error("AccessDenied", None));
    let router = service_router("s3", &state);

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/b")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = call(router, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_text(response).await;
    assert!(body.contains("<Code>AccessDenied</Code>"), "{body}");
}

#[tokio::test]
async fn status_override_wins_over_the_table() {
    let (state, _) = test_state(config(""));
    state.chaos.set("dynamodb", certain_error("ThrottlingException", Some(503)));
    let router = service_router("dynamodb", &state);
    let response = call(
        router,
        target_request("DynamoDB_20120810.Scan", json!({"TableName": "t"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn disabled_chaos_passes_through() {
    let (state, _) = test_state(config(""));
    state.chaos.set(
        "dynamodb",
        ChaosConfig { enabled: false, error_rate: 1.0, ..ChaosConfig::default() },
    );
    let router = service_router("dynamodb", &state);
    let response = call(
        router,
        target_request("DynamoDB_20120810.ListTables", json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn zero_rates_never_inject() {
    let (state, _) = test_state(config(""));
    state.chaos.set("dynamodb", ChaosConfig { enabled: true, ..ChaosConfig::default() });
    let router = service_router("dynamodb", &state);
    for _ in 0..20 {
        let response = call(
            router.clone(),
            target_request("DynamoDB_20120810.ListTables", json!({})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn management_paths_bypass_chaos() {
    let (state, _) = test_state(config(""));
    state.chaos.set("dynamodb", certain_error("InternalServerError", None));
    let router = service_router("dynamodb", &state);
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/_lws/chaos")
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(call(router, request).await.status(), StatusCode::OK);
}
