// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue adapter.
//!
//! Speaks both dialects the SDKs use: JSON selected by an
//! `X-Amz-Target: AmazonSQS.*` header, and the form-encoded `Action`
//! protocol answered in XML. Queue URLs embed the local account so
//! SDK-side URL parsing stays happy.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use lws_config::{QueueSpec, RedrivePolicySpec};
use lws_core::{arn, MessageAttr};
use lws_engine::queue::{QueueAttributes, ReceivedMessage, SendOutcome, SendRequest};
use lws_wire::{action_response, decode_form, numbered_entries, FormParams, Xml};
use serde_json::{json, Value};

use super::{engine_error, json_response, name_from_url, request_id, wire_error, xml_response};
use crate::state::ServerState;

const SERVICE: &str = "sqs";
const TARGET_PREFIX: &str = "AmazonSQS.";

pub fn router(state: ServerState) -> Router {
    Router::new().route("/", post(dispatch)).with_state(state)
}

async fn dispatch(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .and_then(|t| t.strip_prefix(TARGET_PREFIX).map(str::to_string));
    match target {
        Some(operation) => dispatch_json(&state, &operation, &body).await,
        None => dispatch_form(&state, &body).await,
    }
}

// ---------------------------------------------------------------------------
// JSON dialect
// ---------------------------------------------------------------------------

async fn dispatch_json(state: &ServerState, operation: &str, body: &[u8]) -> Response {
    let body: Value = serde_json::from_slice(body).unwrap_or_else(|_| json!({}));
    match operation {
        "CreateQueue" => json_create_queue(state, &body),
        "DeleteQueue" => {
            let name = queue_name(&body, "QueueUrl");
            match state.engines.queues.destroy(&name) {
                Ok(()) => json_response(200, json!({})),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "ListQueues" => {
            let prefix = body["QueueNamePrefix"].as_str();
            let urls: Vec<String> = state
                .engines
                .queues
                .list(prefix)
                .into_iter()
                .map(|name| queue_url(state, &name))
                .collect();
            json_response(200, json!({ "QueueUrls": urls }))
        }
        "GetQueueUrl" => {
            let name = body["QueueName"].as_str().unwrap_or_default();
            if state.engines.queues.exists(name) {
                json_response(200, json!({ "QueueUrl": queue_url(state, name) }))
            } else {
                engine_error(SERVICE, &lws_core::EngineError::not_found("queue", name))
            }
        }
        "GetQueueAttributes" => {
            let name = queue_name(&body, "QueueUrl");
            match state.engines.queues.attributes(&name) {
                Ok(attrs) => {
                    let map: serde_json::Map<String, Value> = attributes_map(&attrs)
                        .into_iter()
                        .map(|(key, value)| (key, Value::String(value)))
                        .collect();
                    json_response(200, json!({ "Attributes": Value::Object(map) }))
                }
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "PurgeQueue" => {
            let name = queue_name(&body, "QueueUrl");
            match state.engines.queues.purge(&name) {
                Ok(()) => json_response(200, json!({})),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "SendMessage" => json_send_message(state, &body),
        "ReceiveMessage" => json_receive_message(state, &body).await,
        "DeleteMessage" => {
            let name = queue_name(&body, "QueueUrl");
            let receipt = body["ReceiptHandle"].as_str().unwrap_or_default();
            match state.engines.queues.delete(&name, receipt) {
                Ok(()) => json_response(200, json!({})),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        other => wire_error(SERVICE, "ValidationException", &format!("unknown operation {other}")),
    }
}

fn json_create_queue(state: &ServerState, body: &Value) -> Response {
    let name = body["QueueName"].as_str().unwrap_or_default().to_string();
    let attributes: HashMap<String, String> = body["Attributes"]
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();
    match state.engines.queues.create(spec_from_attributes(name, &attributes)) {
        Ok(name) => json_response(200, json!({ "QueueUrl": queue_url(state, &name) })),
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn json_send_message(state: &ServerState, body: &Value) -> Response {
    let name = queue_name(body, "QueueUrl");
    let request = SendRequest {
        body: body["MessageBody"].as_str().unwrap_or_default().to_string(),
        attributes: parse_json_message_attributes(&body["MessageAttributes"]),
        delay: Duration::from_secs(body["DelaySeconds"].as_u64().unwrap_or(0)),
        group_id: body["MessageGroupId"].as_str().map(str::to_string),
        dedup_id: body["MessageDeduplicationId"].as_str().map(str::to_string),
    };
    match state.engines.queues.send(&name, request) {
        Ok(outcome) => json_response(
            200,
            json!({
                "MessageId": outcome.message_id,
                "MD5OfMessageBody": outcome.md5_of_body,
            }),
        ),
        Err(err) => engine_error(SERVICE, &err),
    }
}

async fn json_receive_message(state: &ServerState, body: &Value) -> Response {
    let name = queue_name(body, "QueueUrl");
    let max = body["MaxNumberOfMessages"].as_u64().unwrap_or(1) as usize;
    let wait = Duration::from_secs(body["WaitTimeSeconds"].as_u64().unwrap_or(0));
    match state.engines.queues.receive(&name, max, wait).await {
        Ok(messages) => {
            let rendered: Vec<Value> = messages.iter().map(message_to_json).collect();
            json_response(200, json!({ "Messages": rendered }))
        }
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn message_to_json(message: &ReceivedMessage) -> Value {
    json!({
        "MessageId": message.message_id,
        "ReceiptHandle": message.receipt_handle,
        "MD5OfBody": format!("{:x}", md5_digest(&message.body)),
        "Body": message.body,
        "Attributes": {
            "ApproximateReceiveCount": message.receive_count.to_string(),
            "SentTimestamp": message.sent_epoch_ms.to_string(),
        },
        "MessageAttributes": message.attributes,
    })
}

fn md5_digest(body: &str) -> impl std::fmt::LowerHex {
    use md5::Digest;
    md5::Md5::digest(body.as_bytes())
}

fn parse_json_message_attributes(value: &Value) -> HashMap<String, MessageAttr> {
    let Some(map) = value.as_object() else {
        return HashMap::new();
    };
    map.iter()
        .filter_map(|(name, attr)| {
            serde_json::from_value::<MessageAttr>(attr.clone())
                .ok()
                .map(|attr| (name.clone(), attr))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Form dialect
// ---------------------------------------------------------------------------

async fn dispatch_form(state: &ServerState, body: &[u8]) -> Response {
    let params = decode_form(&String::from_utf8_lossy(body));
    let action = params.get("Action").unwrap_or_default().to_string();
    match action.as_str() {
        "CreateQueue" => form_create_queue(state, &params),
        "DeleteQueue" => {
            let name = form_queue_name(&params);
            match state.engines.queues.destroy(&name) {
                Ok(()) => xml_response(action_response("DeleteQueue", vec![], &request_id())),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "ListQueues" => {
            let urls = state
                .engines
                .queues
                .list(params.get("QueueNamePrefix"))
                .into_iter()
                .map(|name| Xml::text("QueueUrl", queue_url(state, &name)));
            xml_response(action_response("ListQueues", urls.collect(), &request_id()))
        }
        "GetQueueUrl" => {
            let name = params.get("QueueName").unwrap_or_default();
            if state.engines.queues.exists(name) {
                xml_response(action_response(
                    "GetQueueUrl",
                    vec![Xml::text("QueueUrl", queue_url(state, name))],
                    &request_id(),
                ))
            } else {
                engine_error(SERVICE, &lws_core::EngineError::not_found("queue", name))
            }
        }
        "GetQueueAttributes" => {
            let name = form_queue_name(&params);
            match state.engines.queues.attributes(&name) {
                Ok(attrs) => {
                    let entries = attributes_map(&attrs).into_iter().map(|(key, value)| {
                        Xml::new("Attribute")
                            .child(Xml::text("Name", key))
                            .child(Xml::text("Value", value))
                    });
                    xml_response(action_response(
                        "GetQueueAttributes",
                        entries.collect(),
                        &request_id(),
                    ))
                }
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "PurgeQueue" => {
            let name = form_queue_name(&params);
            match state.engines.queues.purge(&name) {
                Ok(()) => xml_response(action_response("PurgeQueue", vec![], &request_id())),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "SendMessage" => form_send_message(state, &params),
        "ReceiveMessage" => form_receive_message(state, &params).await,
        "DeleteMessage" => {
            let name = form_queue_name(&params);
            let receipt = params.get("ReceiptHandle").unwrap_or_default();
            match state.engines.queues.delete(&name, receipt) {
                Ok(()) => xml_response(action_response("DeleteMessage", vec![], &request_id())),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        other => wire_error(SERVICE, "ValidationException", &format!("unknown action {other}")),
    }
}

fn form_create_queue(state: &ServerState, params: &FormParams) -> Response {
    let name = params.get("QueueName").unwrap_or_default().to_string();
    let attributes: HashMap<String, String> = numbered_entries(params, "Attribute")
        .into_iter()
        .filter_map(|entry| {
            Some((entry.get("Name")?.clone(), entry.get("Value")?.clone()))
        })
        .collect();
    match state.engines.queues.create(spec_from_attributes(name, &attributes)) {
        Ok(name) => xml_response(action_response(
            "CreateQueue",
            vec![Xml::text("QueueUrl", queue_url(state, &name))],
            &request_id(),
        )),
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn form_send_message(state: &ServerState, params: &FormParams) -> Response {
    let name = form_queue_name(params);
    let request = SendRequest {
        body: params.get("MessageBody").unwrap_or_default().to_string(),
        attributes: parse_form_message_attributes(params),
        delay: Duration::from_secs(
            params.get("DelaySeconds").and_then(|v| v.parse().ok()).unwrap_or(0),
        ),
        group_id: params.get("MessageGroupId").map(str::to_string),
        dedup_id: params.get("MessageDeduplicationId").map(str::to_string),
    };
    match state.engines.queues.send(&name, request) {
        Ok(SendOutcome { message_id, md5_of_body }) => xml_response(action_response(
            "SendMessage",
            vec![
                Xml::text("MessageId", message_id),
                Xml::text("MD5OfMessageBody", md5_of_body),
            ],
            &request_id(),
        )),
        Err(err) => engine_error(SERVICE, &err),
    }
}

async fn form_receive_message(state: &ServerState, params: &FormParams) -> Response {
    let name = form_queue_name(params);
    let max = params.get("MaxNumberOfMessages").and_then(|v| v.parse().ok()).unwrap_or(1);
    let wait = Duration::from_secs(
        params.get("WaitTimeSeconds").and_then(|v| v.parse().ok()).unwrap_or(0),
    );
    match state.engines.queues.receive(&name, max, wait).await {
        Ok(messages) => {
            let rendered = messages.iter().map(|message| {
                Xml::new("Message")
                    .child(Xml::text("MessageId", &message.message_id))
                    .child(Xml::text("ReceiptHandle", &message.receipt_handle))
                    .child(Xml::text("MD5OfBody", format!("{:x}", md5_digest(&message.body))))
                    .child(Xml::text("Body", &message.body))
                    .child(
                        Xml::new("Attribute")
                            .child(Xml::text("Name", "ApproximateReceiveCount"))
                            .child(Xml::text("Value", message.receive_count.to_string())),
                    )
                    .child(
                        Xml::new("Attribute")
                            .child(Xml::text("Name", "SentTimestamp"))
                            .child(Xml::text("Value", message.sent_epoch_ms.to_string())),
                    )
            });
            xml_response(action_response("ReceiveMessage", rendered.collect(), &request_id()))
        }
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn parse_form_message_attributes(params: &FormParams) -> HashMap<String, MessageAttr> {
    numbered_entries(params, "MessageAttribute")
        .into_iter()
        .filter_map(|entry| {
            let name = entry.get("Name")?.clone();
            let data_type =
                entry.get("Value.DataType").cloned().unwrap_or_else(|| "String".to_string());
            let string_value = entry.get("Value.StringValue").cloned();
            Some((name, MessageAttr { data_type, string_value }))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn queue_url(state: &ServerState, name: &str) -> String {
    let port = state.config.service(SERVICE).port;
    format!("http://localhost:{port}/{}/{name}", arn::ACCOUNT)
}

fn queue_name(body: &Value, field: &str) -> String {
    name_from_url(body[field].as_str().unwrap_or_default()).to_string()
}

fn form_queue_name(params: &FormParams) -> String {
    name_from_url(params.get("QueueUrl").unwrap_or_default()).to_string()
}

/// Build a queue spec from wire attributes (shared by both dialects).
fn spec_from_attributes(name: String, attributes: &HashMap<String, String>) -> QueueSpec {
    let fifo = attributes.get("FifoQueue").is_some_and(|v| v == "true")
        || name.ends_with(".fifo");
    let redrive = attributes.get("RedrivePolicy").and_then(|raw| {
        let policy: Value = serde_json::from_str(raw).ok()?;
        let target = policy["deadLetterTargetArn"].as_str()?;
        let max_receive_count = match &policy["maxReceiveCount"] {
            Value::String(s) => s.parse().ok()?,
            Value::Number(n) => n.as_u64()? as u32,
            _ => return None,
        };
        Some(RedrivePolicySpec {
            target: lws_core::arn::leaf_name(target).to_string(),
            max_receive_count,
        })
    });
    QueueSpec {
        name,
        visibility_timeout_secs: attributes
            .get("VisibilityTimeout")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
        fifo,
        content_based_dedup: attributes
            .get("ContentBasedDeduplication")
            .is_some_and(|v| v == "true"),
        redrive,
        tags: HashMap::new(),
    }
}

fn attributes_map(attrs: &QueueAttributes) -> Vec<(String, String)> {
    let mut entries = vec![
        ("QueueArn".to_string(), attrs.arn.clone()),
        (
            "ApproximateNumberOfMessages".to_string(),
            attrs.counts.visible.to_string(),
        ),
        (
            "ApproximateNumberOfMessagesNotVisible".to_string(),
            attrs.counts.in_flight.to_string(),
        ),
        (
            "ApproximateNumberOfMessagesDelayed".to_string(),
            attrs.counts.delayed.to_string(),
        ),
        (
            "VisibilityTimeout".to_string(),
            attrs.visibility_timeout.as_secs().to_string(),
        ),
    ];
    if attrs.fifo {
        entries.push(("FifoQueue".to_string(), "true".to_string()));
    }
    if let Some(target) = &attrs.dlq_target {
        entries.push((
            "RedrivePolicy".to_string(),
            json!({
                "deadLetterTargetArn": lws_core::arn::queue(target),
                "maxReceiveCount": attrs.max_receive_count,
            })
            .to_string(),
        ));
    }
    entries
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
