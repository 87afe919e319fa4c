// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation extraction from buffered requests.
//!
//! Runs once in the logging layer; the result rides the request
//! extensions so mocking and auth see the same name.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use lws_wire::{
    decode_form, object_store_operation, operation_from_action, operation_from_target,
    target_prefix, ObjectRequest,
};

/// The normalized kebab-case operation, if one could be determined.
#[derive(Debug, Clone)]
pub struct ExtractedOperation(pub Option<String>);

/// Buffered request body, shared down the chain.
#[derive(Debug, Clone)]
pub struct RequestBytes(pub Bytes);

pub fn extract(
    service: &str,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> Option<String> {
    if super::is_management(uri.path()) {
        return None;
    }
    match service {
        "s3" => {
            let query = decode_form(uri.query().unwrap_or_default());
            let request = ObjectRequest {
                method: method.as_str(),
                path: uri.path(),
                query_keys: query.iter().map(|(k, _)| k).collect(),
                has_copy_source: headers.contains_key("x-amz-copy-source"),
            };
            object_store_operation(&request)
        }
        "sns" | "sts" => from_action(uri, headers, body),
        "sqs" => from_target(service, headers).or_else(|| from_action(uri, headers, body)),
        _ => from_target(service, headers),
    }
}

fn from_target(service: &str, headers: &HeaderMap) -> Option<String> {
    let prefix = target_prefix(service)?;
    let target = headers.get("x-amz-target")?.to_str().ok()?;
    operation_from_target(prefix, target)
}

fn from_action(uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Option<String> {
    let query = decode_form(uri.query().unwrap_or_default());
    let query_action = query.get("Action").map(str::to_string);

    let form_action = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .filter(|ct| ct.contains("application/x-www-form-urlencoded"))
        .and_then(|_| {
            let params = decode_form(&String::from_utf8_lossy(body));
            params.get("Action").map(str::to_string)
        });

    operation_from_action(query_action.as_deref(), form_action.as_deref())
}
