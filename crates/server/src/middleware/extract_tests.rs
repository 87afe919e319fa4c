// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::extract::extract;
use axum::http::{HeaderMap, HeaderValue, Method, Uri};

fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(
            name.parse::<axum::http::HeaderName>().unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    map
}

#[test]
fn json_target_services_extract_from_header() {
    let operation = extract(
        "dynamodb",
        &Method::POST,
        &Uri::from_static("/"),
        &headers(&[("x-amz-target", "DynamoDB_20120810.PutItem")]),
        b"{}",
    );
    assert_eq!(operation.as_deref(), Some("put-item"));
}

#[test]
fn form_services_extract_from_body() {
    let operation = extract(
        "sns",
        &Method::POST,
        &Uri::from_static("/"),
        &headers(&[("content-type", "application/x-www-form-urlencoded")]),
        b"Action=Publish&TopicArn=t",
    );
    assert_eq!(operation.as_deref(), Some("publish"));
}

#[test]
fn form_services_prefer_query_action() {
    let operation = extract(
        "sns",
        &Method::POST,
        &Uri::from_static("/?Action=CreateTopic"),
        &headers(&[("content-type", "application/x-www-form-urlencoded")]),
        b"Action=Publish",
    );
    assert_eq!(operation.as_deref(), Some("create-topic"));
}

#[test]
fn queue_service_tries_target_then_action() {
    let operation = extract(
        "sqs",
        &Method::POST,
        &Uri::from_static("/"),
        &headers(&[("x-amz-target", "AmazonSQS.SendMessage")]),
        b"",
    );
    assert_eq!(operation.as_deref(), Some("send-message"));

    let operation = extract(
        "sqs",
        &Method::POST,
        &Uri::from_static("/"),
        &headers(&[("content-type", "application/x-www-form-urlencoded")]),
        b"Action=DeleteMessage",
    );
    assert_eq!(operation.as_deref(), Some("delete-message"));
}

#[test]
fn object_store_maps_method_and_path() {
    let operation = extract(
        "s3",
        &Method::PUT,
        &Uri::from_static("/assets/cat.jpg"),
        &HeaderMap::new(),
        b"",
    );
    assert_eq!(operation.as_deref(), Some("put-object"));

    let operation = extract(
        "s3",
        &Method::GET,
        &Uri::from_static("/assets?tagging"),
        &HeaderMap::new(),
        b"",
    );
    assert_eq!(operation.as_deref(), Some("get-bucket-tagging"));
}

#[test]
fn management_paths_are_skipped() {
    let operation = extract(
        "dynamodb",
        &Method::GET,
        &Uri::from_static("/_lws/resources"),
        &headers(&[("x-amz-target", "DynamoDB_20120810.Scan")]),
        b"",
    );
    assert_eq!(operation, None);
}

#[test]
fn wrong_prefix_yields_none() {
    let operation = extract(
        "dynamodb",
        &Method::POST,
        &Uri::from_static("/"),
        &headers(&[("x-amz-target", "AWSEvents.PutEvents")]),
        b"",
    );
    assert_eq!(operation, None);
}
