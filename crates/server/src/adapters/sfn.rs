// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-machine adapter: `X-Amz-Target: AWSStepFunctions.*` over
//! JSON.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use lws_core::{iso8601_ms, Clock, SystemClock};
use lws_engine::sfn::Execution;
use serde_json::{json, Value};

use super::{engine_error, json_response, wire_error};
use crate::state::ServerState;

const SERVICE: &str = "stepfunctions";
const TARGET_PREFIX: &str = "AWSStepFunctions.";

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
    let sfn = &state.engines.sfn;

    match operation {
        "StartExecution" => {
            let machine = machine_name(&body);
            let input = parse_input(&body);
            let name = body["name"].as_str().map(str::to_string);
            match sfn.start_execution(&machine, input, name) {
                Ok(execution_arn) => json_response(
                    200,
                    json!({
                        "executionArn": execution_arn,
                        "startDate": iso8601_ms(SystemClock.epoch_ms()),
                    }),
                ),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "StartSyncExecution" => {
            let machine = machine_name(&body);
            let input = parse_input(&body);
            let name = body["name"].as_str().map(str::to_string);
            match sfn.start_sync_execution(&machine, input, name).await {
                Ok(execution) => json_response(200, execution_to_json(&execution)),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "DescribeExecution" => {
            let execution_arn = body["executionArn"].as_str().unwrap_or_default();
            match sfn.describe_execution(execution_arn) {
                Ok(execution) => json_response(200, execution_to_json(&execution)),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "ListExecutions" => {
            let machine = body["stateMachineArn"]
                .as_str()
                .map(|machine_arn| lws_core::arn::leaf_name(machine_arn).to_string());
            let executions: Vec<Value> = sfn
                .list_executions(machine.as_deref())
                .iter()
                .map(|execution| {
                    json!({
                        "executionArn": execution.arn,
                        "name": execution.name,
                        "status": execution.status.as_str(),
                        "startDate": iso8601_ms(execution.start_epoch_ms),
                    })
                })
                .collect();
            json_response(200, json!({ "executions": executions }))
        }
        "ListStateMachines" => {
            let machines: Vec<Value> = sfn
                .list_state_machines()
                .into_iter()
                .map(|(name, machine_arn)| {
                    json!({ "name": name, "stateMachineArn": machine_arn })
                })
                .collect();
            json_response(200, json!({ "stateMachines": machines }))
        }
        other => wire_error(SERVICE, "ValidationException", &format!("unknown operation {other}")),
    }
}

fn machine_name(body: &Value) -> String {
    let machine_arn = body["stateMachineArn"].as_str().unwrap_or_default();
    if machine_arn.is_empty() {
        return body["name"].as_str().unwrap_or_default().to_string();
    }
    lws_core::arn::leaf_name(machine_arn).to_string()
}

/// The `input` field is a JSON-encoded string on the wire.
fn parse_input(body: &Value) -> Value {
    match body["input"].as_str() {
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| json!({ "raw": raw })),
        None => json!({}),
    }
}

fn execution_to_json(execution: &Execution) -> Value {
    let mut rendered = json!({
        "executionArn": execution.arn,
        "stateMachineArn": lws_core::arn::state_machine(&execution.machine_name),
        "name": execution.name,
        "status": execution.status.as_str(),
        "startDate": iso8601_ms(execution.start_epoch_ms),
    });
    if let Some(end) = execution.end_epoch_ms {
        rendered["stopDate"] = Value::String(iso8601_ms(end));
    }
    if let Some(output) = &execution.output {
        rendered["output"] = Value::String(output.to_string());
    }
    if let Some(error) = &execution.error {
        rendered["error"] = Value::String(error.clone());
    }
    if let Some(cause) = &execution.cause {
        rendered["cause"] = Value::String(cause.clone());
    }
    rendered
}

#[cfg(test)]
#[path = "sfn_tests.rs"]
mod tests;
