// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation-name extraction.
//!
//! Mock rules and the auth middleware key on a normalized kebab-case
//! operation name (`get-item`, `list-objects-v2`). Each dialect has
//! its own way of naming the operation; these functions pull it out.

use std::collections::HashSet;

/// `X-Amz-Target` prefix per JSON-dialect service.
pub fn target_prefix(service: &str) -> Option<&'static str> {
    match service {
        "dynamodb" => Some("DynamoDB_20120810."),
        "sqs" => Some("AmazonSQS."),
        "events" => Some("AWSEvents."),
        "stepfunctions" => Some("AWSStepFunctions."),
        "cognito-idp" => Some("AWSCognitoIdentityProviderService."),
        "ssm" => Some("AmazonSSM."),
        "secretsmanager" => Some("secretsmanager."),
        _ => None,
    }
}

/// Convert `GetItem` or `ListObjectsV2` to `get-item` / `list-objects-v2`.
pub fn camel_to_kebab(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            // Boundary between an acronym run and a word, or between a
            // lowercase/digit and an uppercase letter.
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() {
                out.push('-');
            } else if prev.is_ascii_uppercase() && next_is_lower {
                out.push('-');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Extract the operation from an `X-Amz-Target` header value, checking
/// the service prefix.
pub fn operation_from_target(prefix: &str, target: &str) -> Option<String> {
    let raw = target.strip_prefix(prefix)?;
    if raw.is_empty() {
        return None;
    }
    Some(camel_to_kebab(raw))
}

/// Extract the operation from the form dialect: a query-string `Action`
/// wins over a body `Action`.
pub fn operation_from_action(
    query_action: Option<&str>,
    body_action: Option<&str>,
) -> Option<String> {
    query_action.or(body_action).map(camel_to_kebab)
}

/// The parts of an object-store REST request that select the operation.
#[derive(Debug, Clone)]
pub struct ObjectRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query_keys: HashSet<&'a str>,
    pub has_copy_source: bool,
}

/// Map an object-store REST request to its kebab-case operation name.
pub fn object_store_operation(req: &ObjectRequest<'_>) -> Option<String> {
    let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();
    let op = match segments.len() {
        0 => match req.method {
            "GET" => Some("list-buckets"),
            _ => None,
        },
        1 => bucket_operation(req),
        _ => object_operation(req),
    };
    op.map(str::to_string)
}

fn bucket_operation(req: &ObjectRequest<'_>) -> Option<&'static str> {
    const SUBRESOURCE_OPS: &[(&str, &str, &str)] = &[
        ("GET", "location", "get-bucket-location"),
        ("GET", "tagging", "get-bucket-tagging"),
        ("PUT", "tagging", "put-bucket-tagging"),
        ("DELETE", "tagging", "delete-bucket-tagging"),
        ("GET", "policy", "get-bucket-policy"),
        ("PUT", "policy", "put-bucket-policy"),
        ("GET", "notification", "get-bucket-notification-configuration"),
        ("PUT", "notification", "put-bucket-notification-configuration"),
        ("POST", "delete", "delete-objects"),
    ];
    for (method, param, op) in SUBRESOURCE_OPS {
        if req.method == *method && req.query_keys.contains(param) {
            return Some(op);
        }
    }
    match req.method {
        "PUT" => Some("create-bucket"),
        "DELETE" => Some("delete-bucket"),
        "HEAD" => Some("head-bucket"),
        "GET" => Some("list-objects-v2"),
        _ => None,
    }
}

fn object_operation(req: &ObjectRequest<'_>) -> Option<&'static str> {
    match req.method {
        "PUT" if req.has_copy_source => Some("copy-object"),
        "PUT" => Some("put-object"),
        "GET" => Some("get-object"),
        "DELETE" => Some("delete-object"),
        "HEAD" => Some("head-object"),
        _ => None,
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
