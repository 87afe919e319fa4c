// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter-store adapter: `X-Amz-Target: AmazonSSM.*` over JSON.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use lws_core::iso8601_ms;
use lws_engine::params::Parameter;
use serde_json::{json, Value};

use super::{engine_error, json_response, wire_error};
use crate::state::ServerState;

const SERVICE: &str = "ssm";
const TARGET_PREFIX: &str = "AmazonSSM.";

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
    let params = &state.engines.params;

    match operation {
        "PutParameter" => {
            let name = body["Name"].as_str().unwrap_or_default();
            let value = body["Value"].as_str().unwrap_or_default();
            let secure = body["Type"].as_str() == Some("SecureString");
            let overwrite = body["Overwrite"].as_bool().unwrap_or(false);
            match params.put(name, value, secure, overwrite) {
                Ok(version) => json_response(200, json!({ "Version": version })),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "GetParameter" => {
            let name = body["Name"].as_str().unwrap_or_default();
            match params.get(name) {
                Ok(parameter) => {
                    json_response(200, json!({ "Parameter": parameter_to_json(&parameter) }))
                }
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "GetParameters" => {
            let names: Vec<&str> = body["Names"]
                .as_array()
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let mut found = Vec::new();
            let mut invalid = Vec::new();
            for name in names {
                match params.get(name) {
                    Ok(parameter) => found.push(parameter_to_json(&parameter)),
                    Err(_) => invalid.push(name.to_string()),
                }
            }
            json_response(
                200,
                json!({ "Parameters": found, "InvalidParameters": invalid }),
            )
        }
        "GetParametersByPath" => {
            let path = body["Path"].as_str().unwrap_or("/");
            let recursive = body["Recursive"].as_bool().unwrap_or(false);
            let found: Vec<Value> = params
                .get_by_path(path, recursive)
                .iter()
                .map(parameter_to_json)
                .collect();
            json_response(200, json!({ "Parameters": found }))
        }
        "DeleteParameter" => {
            let name = body["Name"].as_str().unwrap_or_default();
            match params.delete(name) {
                Ok(()) => json_response(200, json!({})),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        other => wire_error(SERVICE, "ValidationException", &format!("unknown operation {other}")),
    }
}

fn parameter_to_json(parameter: &Parameter) -> Value {
    json!({
        "Name": parameter.name,
        "ARN": parameter.arn,
        "Type": parameter.type_name(),
        "Value": parameter.value,
        "Version": parameter.version,
        "LastModifiedDate": iso8601_ms(parameter.last_modified_ms),
    })
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
