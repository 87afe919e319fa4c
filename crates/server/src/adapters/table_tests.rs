// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use serde_json::json;

use crate::test_support::{body_json, call, config, target_request, test_state};

fn users_router() -> axum::Router {
    let (state, _) = test_state(config(
        r#"
[[tables]]
name = "users"
[tables.partition_key]
name = "id"
"#,
    ));
    super::router(state.for_service("dynamodb"))
}

fn target(op: &str) -> String {
    format!("DynamoDB_20120810.{op}")
}

#[tokio::test]
async fn put_then_get_returns_the_item() {
    let router = users_router();
    call(
        router.clone(),
        target_request(
            &target("PutItem"),
            json!({"TableName": "users", "Item": {"id": {"S": "1"}, "v": {"S": "a"}}}),
        ),
    )
    .await;
    let got = body_json(
        call(
            router,
            target_request(&target("GetItem"), json!({"TableName": "users", "Key": {"id": {"S": "1"}}})),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(got["Item"]["id"]["S"], "1");
    assert_eq!(got["Item"]["v"]["S"], "a");
}

#[tokio::test]
async fn get_missing_item_returns_empty_object() {
    let router = users_router();
    let got = body_json(
        call(
            router,
            target_request(&target("GetItem"), json!({"TableName": "users", "Key": {"id": {"S": "nope"}}})),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert!(got.get("Item").is_none());
}

#[tokio::test]
async fn update_item_with_expression_names_and_values() {
    let router = users_router();
    let updated = body_json(
        call(
            router,
            target_request(
                &target("UpdateItem"),
                json!({
                    "TableName": "users",
                    "Key": {"id": {"S": "1"}},
                    "UpdateExpression": "SET #v = :v",
                    "ExpressionAttributeNames": {"#v": "version"},
                    "ExpressionAttributeValues": {":v": {"N": "2"}},
                }),
            ),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["Attributes"]["version"]["N"], "2");
}

#[tokio::test]
async fn scan_and_query_report_counts() {
    let router = users_router();
    for id in ["a", "b"] {
        call(
            router.clone(),
            target_request(
                &target("PutItem"),
                json!({"TableName": "users", "Item": {"id": {"S": id}}}),
            ),
        )
        .await;
    }
    let scanned = body_json(
        call(router.clone(), target_request(&target("Scan"), json!({"TableName": "users"}))).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(scanned["Count"], 2);

    let queried = body_json(
        call(
            router,
            target_request(
                &target("Query"),
                json!({
                    "TableName": "users",
                    "KeyConditionExpression": "id = :id",
                    "ExpressionAttributeValues": {":id": {"S": "a"}},
                }),
            ),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(queried["Count"], 1);
    assert_eq!(queried["Items"][0]["id"]["S"], "a");
}

#[tokio::test]
async fn transact_write_condition_failure_reports_reasons() {
    let router = users_router();
    let response = call(
        router.clone(),
        target_request(
            &target("TransactWriteItems"),
            json!({
                "TransactItems": [
                    {"ConditionCheck": {
                        "TableName": "users",
                        "Key": {"id": {"S": "exists"}},
                        "ConditionExpression": "attribute_exists(id)",
                    }},
                    {"Put": {
                        "TableName": "users",
                        "Item": {"id": {"S": "new-item"}},
                    }},
                ]
            }),
        ),
    )
    .await;
    let error = body_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(error["__type"], "TransactionCanceledException");
    assert_eq!(error["CancellationReasons"][0]["Code"], "ConditionalCheckFailed");
    assert_eq!(error["CancellationReasons"][1]["Code"], "None");

    // Nothing was written.
    let got = body_json(
        call(
            router,
            target_request(
                &target("GetItem"),
                json!({"TableName": "users", "Key": {"id": {"S": "new-item"}}}),
            ),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert!(got.get("Item").is_none());
}

#[tokio::test]
async fn batch_write_and_batch_get() {
    let router = users_router();
    call(
        router.clone(),
        target_request(
            &target("BatchWriteItem"),
            json!({
                "RequestItems": {
                    "users": [
                        {"PutRequest": {"Item": {"id": {"S": "1"}}}},
                        {"PutRequest": {"Item": {"id": {"S": "2"}}}},
                    ]
                }
            }),
        ),
    )
    .await;
    let got = body_json(
        call(
            router,
            target_request(
                &target("BatchGetItem"),
                json!({
                    "RequestItems": {
                        "users": {"Keys": [{"id": {"S": "1"}}, {"id": {"S": "missing"}}]}
                    }
                }),
            ),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(got["Responses"]["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_table_maps_to_resource_not_found() {
    let router = users_router();
    let response = call(
        router,
        target_request(&target("Scan"), json!({"TableName": "ghost"})),
    )
    .await;
    let error = body_json(response, StatusCode::NOT_FOUND).await;
    assert_eq!(error["__type"], "ResourceNotFoundException");
}

#[tokio::test]
async fn missing_target_header_is_a_validation_error() {
    let router = users_router();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/")
        .body(axum::body::Body::from("{}"))
        .unwrap();
    let response = call(router, request).await;
    let error = body_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(error["__type"], "ValidationException");
}
