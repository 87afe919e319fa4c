// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    simple = { "GetItem", "get-item" },
    version_suffix = { "ListObjectsV2", "list-objects-v2" },
    acronym = { "StartDBInstance", "start-db-instance" },
    single_word = { "Publish", "publish" },
    already_lower = { "publish", "publish" },
)]
fn camel_to_kebab_cases(input: &str, expected: &str) {
    assert_eq!(camel_to_kebab(input), expected);
}

#[test]
fn target_extraction_checks_prefix() {
    assert_eq!(
        operation_from_target("DynamoDB_20120810.", "DynamoDB_20120810.PutItem"),
        Some("put-item".to_string())
    );
    assert_eq!(operation_from_target("DynamoDB_20120810.", "AWSEvents.PutEvents"), None);
    assert_eq!(operation_from_target("DynamoDB_20120810.", "DynamoDB_20120810."), None);
}

#[test]
fn action_prefers_query_over_body() {
    assert_eq!(
        operation_from_action(Some("SendMessage"), Some("DeleteMessage")),
        Some("send-message".to_string())
    );
    assert_eq!(operation_from_action(None, Some("Publish")), Some("publish".to_string()));
    assert_eq!(operation_from_action(None, None), None);
}

fn object_req<'a>(
    method: &'a str,
    path: &'a str,
    query_keys: &[&'a str],
) -> ObjectRequest<'a> {
    ObjectRequest {
        method,
        path,
        query_keys: query_keys.iter().copied().collect(),
        has_copy_source: false,
    }
}

#[parameterized(
    list_buckets = { "GET", "/", "list-buckets" },
    create_bucket = { "PUT", "/photos", "create-bucket" },
    head_bucket = { "HEAD", "/photos", "head-bucket" },
    list_objects = { "GET", "/photos", "list-objects-v2" },
    put_object = { "PUT", "/photos/cat.jpg", "put-object" },
    get_object = { "GET", "/photos/cat.jpg", "get-object" },
    head_object = { "HEAD", "/photos/a/b/c.txt", "head-object" },
    delete_object = { "DELETE", "/photos/cat.jpg", "delete-object" },
)]
fn object_store_path_mapping(method: &str, path: &str, expected: &str) {
    let req = object_req(method, path, &[]);
    assert_eq!(object_store_operation(&req).as_deref(), Some(expected));
}

#[test]
fn bucket_subresources_win_over_simple_ops() {
    let req = object_req("GET", "/photos", &["tagging"]);
    assert_eq!(object_store_operation(&req).as_deref(), Some("get-bucket-tagging"));
    let req = object_req("PUT", "/photos", &["notification"]);
    assert_eq!(
        object_store_operation(&req).as_deref(),
        Some("put-bucket-notification-configuration")
    );
}

#[test]
fn copy_source_header_selects_copy_object() {
    let mut req = object_req("PUT", "/photos/copy.jpg", &[]);
    req.has_copy_source = true;
    assert_eq!(object_store_operation(&req).as_deref(), Some("copy-object"));
}

#[test]
fn unknown_methods_map_to_none() {
    let req = object_req("PATCH", "/photos/cat.jpg", &[]);
    assert_eq!(object_store_operation(&req), None);
}
