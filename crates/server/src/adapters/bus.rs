// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-bus adapter: `X-Amz-Target: AWSEvents.*` over JSON.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use lws_config::RuleSpec;
use lws_core::EngineError;
use lws_engine::bus::PutEventsEntry;
use serde_json::{json, Value};

use super::{engine_error, json_response, wire_error};
use crate::state::ServerState;

const SERVICE: &str = "events";
const TARGET_PREFIX: &str = "AWSEvents.";

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
    match handle(&state, operation, &body) {
        Ok(response) => response,
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn handle(state: &ServerState, operation: &str, body: &Value) -> Result<Response, EngineError> {
    let bus = &state.engines.bus;
    match operation {
        "PutEvents" => {
            let entries = body["Entries"]
                .as_array()
                .ok_or_else(|| EngineError::validation("Entries must be a list"))?;
            let parsed: Vec<PutEventsEntry> = entries
                .iter()
                .map(|entry| PutEventsEntry {
                    source: entry["Source"].as_str().unwrap_or_default().to_string(),
                    detail_type: entry["DetailType"].as_str().unwrap_or_default().to_string(),
                    detail: entry["Detail"].as_str().unwrap_or("{}").to_string(),
                    bus_name: entry["EventBusName"].as_str().map(str::to_string),
                })
                .collect();
            let results = bus.put_events(parsed);
            let rendered: Vec<Value> =
                results.iter().map(|r| json!({ "EventId": r.event_id })).collect();
            Ok(json_response(
                200,
                json!({ "Entries": rendered, "FailedEntryCount": 0 }),
            ))
        }
        "PutRule" => {
            let bus_name = body["EventBusName"].as_str().unwrap_or("default");
            let spec = RuleSpec {
                name: required_str(body, "Name")?,
                pattern: body["EventPattern"]
                    .as_str()
                    .and_then(|raw| serde_json::from_str(raw).ok()),
                schedule: body["ScheduleExpression"].as_str().map(str::to_string),
                enabled: body["State"].as_str() != Some("DISABLED"),
                targets: Vec::new(),
            };
            let rule_arn = bus.put_rule(bus_name, spec)?;
            Ok(json_response(200, json!({ "RuleArn": rule_arn })))
        }
        "PutTargets" => {
            let bus_name = body["EventBusName"].as_str().unwrap_or("default");
            let rule_name = required_str(body, "Rule")?;
            let targets: Vec<String> = body["Targets"]
                .as_array()
                .map(|targets| {
                    targets
                        .iter()
                        .filter_map(|t| t["Arn"].as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            let mut rule = bus
                .list_rules(bus_name)?
                .into_iter()
                .find(|r| r.name == rule_name)
                .ok_or_else(|| EngineError::not_found("rule", &rule_name))?;
            rule.targets.extend(targets);
            bus.put_rule(
                bus_name,
                RuleSpec {
                    name: rule.name,
                    pattern: rule.pattern,
                    schedule: rule.schedule,
                    enabled: rule.enabled,
                    targets: rule.targets,
                },
            )?;
            Ok(json_response(
                200,
                json!({ "FailedEntryCount": 0, "FailedEntries": [] }),
            ))
        }
        "DeleteRule" => {
            let bus_name = body["EventBusName"].as_str().unwrap_or("default");
            bus.delete_rule(bus_name, &required_str(body, "Name")?)?;
            Ok(json_response(200, json!({})))
        }
        "ListRules" => {
            let bus_name = body["EventBusName"].as_str().unwrap_or("default");
            let rules: Vec<Value> = bus
                .list_rules(bus_name)?
                .into_iter()
                .map(|rule| {
                    json!({
                        "Name": rule.name,
                        "Arn": lws_core::arn::rule(&rule.name),
                        "State": if rule.enabled { "ENABLED" } else { "DISABLED" },
                        "ScheduleExpression": rule.schedule,
                    })
                })
                .collect();
            Ok(json_response(200, json!({ "Rules": rules })))
        }
        "CreateEventBus" => {
            let name = required_str(body, "Name")?;
            let bus_arn = bus.create_bus(&name);
            Ok(json_response(200, json!({ "EventBusArn": bus_arn })))
        }
        "DeleteEventBus" => {
            bus.delete_bus(&required_str(body, "Name")?)?;
            Ok(json_response(200, json!({})))
        }
        "DescribeEventBus" => {
            let name = body["Name"].as_str().unwrap_or("default");
            let (name, bus_arn) = bus.describe_bus(name)?;
            Ok(json_response(200, json!({ "Name": name, "Arn": bus_arn })))
        }
        "ListEventBuses" => {
            let buses: Vec<Value> = bus
                .list_buses()
                .into_iter()
                .map(|name| json!({ "Name": name, "Arn": lws_core::arn::event_bus(&name) }))
                .collect();
            Ok(json_response(200, json!({ "EventBuses": buses })))
        }
        other => Ok(wire_error(
            SERVICE,
            "ValidationException",
            &format!("unknown operation {other}"),
        )),
    }
}

fn required_str(body: &Value, field: &str) -> Result<String, EngineError> {
    body[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| EngineError::validation(format!("{field} is required")))
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
