// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret-store adapter: `X-Amz-Target: secretsmanager.*` over JSON.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use lws_core::iso8601_ms;
use serde_json::{json, Value};

use super::{engine_error, json_response, wire_error};
use crate::state::ServerState;

const SERVICE: &str = "secretsmanager";
const TARGET_PREFIX: &str = "secretsmanager.";

pub fn router(state: ServerState) -> Router {
    Router::new().route("/", post(dispatch)).with_state(state)
}

async fn dispatch(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(operation) = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .and_then(|t| t.strip_prefix(TARGET_PREFIX))
    else {
        return wire_error(SERVICE, "ValidationException", "missing X-Amz-Target");
    };
    let body: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
    let secrets = &state.engines.secrets;

    match operation {
        "CreateSecret" => {
            let name = body["Name"].as_str().unwrap_or_default();
            let value = body["SecretString"].as_str().unwrap_or_default();
            match secrets.create(name, value) {
                Ok(secret) => json_response(
                    200,
                    json!({
                        "ARN": secret.arn,
                        "Name": secret.name,
                        "VersionId": secret.version_id,
                    }),
                ),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "GetSecretValue" => {
            let id = body["SecretId"].as_str().unwrap_or_default();
            match secrets.get(id) {
                Ok(secret) => json_response(
                    200,
                    json!({
                        "ARN": secret.arn,
                        "Name": secret.name,
                        "SecretString": secret.value,
                        "VersionId": secret.version_id,
                        "CreatedDate": iso8601_ms(secret.created_ms),
                    }),
                ),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "PutSecretValue" => {
            let id = body["SecretId"].as_str().unwrap_or_default();
            let value = body["SecretString"].as_str().unwrap_or_default();
            match secrets.put_value(id, value) {
                Ok(secret) => json_response(
                    200,
                    json!({
                        "ARN": secret.arn,
                        "Name": secret.name,
                        "VersionId": secret.version_id,
                    }),
                ),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "DeleteSecret" => {
            let id = body["SecretId"].as_str().unwrap_or_default();
            match secrets.delete(id) {
                Ok(deleted_ms) => json_response(
                    200,
                    json!({ "Name": id, "DeletionDate": iso8601_ms(deleted_ms) }),
                ),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "RestoreSecret" => {
            let id = body["SecretId"].as_str().unwrap_or_default();
            match secrets.restore(id) {
                Ok(()) => json_response(200, json!({ "Name": id })),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "ListSecrets" => {
            let listed: Vec<Value> = secrets
                .list()
                .iter()
                .map(|secret| json!({ "ARN": secret.arn, "Name": secret.name }))
                .collect();
            json_response(200, json!({ "SecretList": listed }))
        }
        other => wire_error(SERVICE, "ValidationException", &format!("unknown operation {other}")),
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
