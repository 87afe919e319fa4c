// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic adapter: form-encoded `Action` requests answered in XML.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use lws_core::MessageAttr;
use lws_engine::topic::{PublishRequest, SubscriptionProtocol};
use lws_wire::{action_response, decode_form, numbered_entries, FormParams, Xml};

use super::{engine_error, name_from_url, request_id, wire_error, xml_response};
use crate::state::ServerState;

const SERVICE: &str = "sns";

pub fn router(state: ServerState) -> Router {
    Router::new().route("/", post(dispatch)).with_state(state)
}

async fn dispatch(State(state): State<ServerState>, body: Bytes) -> Response {
    let params = decode_form(&String::from_utf8_lossy(&body));
    let action = params.get("Action").unwrap_or_default().to_string();
    let topics = &state.engines.topics;
    match action.as_str() {
        "CreateTopic" => {
            let name = params.get("Name").unwrap_or_default();
            match topics.create_topic(name) {
                Ok(topic_arn) => xml_response(action_response(
                    "CreateTopic",
                    vec![Xml::text("TopicArn", topic_arn)],
                    &request_id(),
                )),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "DeleteTopic" => {
            let name = name_from_arn(&params);
            match topics.delete_topic(&name) {
                Ok(()) => xml_response(action_response("DeleteTopic", vec![], &request_id())),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "ListTopics" => {
            let rendered = topics.list_topics().into_iter().map(|name| {
                Xml::new("member")
                    .child(Xml::text("TopicArn", lws_core::arn::topic(&name)))
            });
            xml_response(action_response(
                "ListTopics",
                vec![Xml::new("Topics").children(rendered)],
                &request_id(),
            ))
        }
        "Subscribe" => subscribe(&state, &params),
        "Unsubscribe" => {
            let sub_arn = params.get("SubscriptionArn").unwrap_or_default();
            match topics.unsubscribe(sub_arn) {
                Ok(()) => xml_response(action_response("Unsubscribe", vec![], &request_id())),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "ListSubscriptionsByTopic" => {
            let name = name_from_arn(&params);
            match topics.subscriptions(&name) {
                Ok(subs) => {
                    let rendered = subs.into_iter().map(|sub| {
                        Xml::new("member")
                            .child(Xml::text("SubscriptionArn", sub.arn))
                            .child(Xml::text(
                                "Protocol",
                                match sub.protocol {
                                    SubscriptionProtocol::Queue => "sqs",
                                    SubscriptionProtocol::Compute => "lambda",
                                },
                            ))
                            .child(Xml::text("Endpoint", sub.endpoint))
                    });
                    xml_response(action_response(
                        "ListSubscriptionsByTopic",
                        vec![Xml::new("Subscriptions").children(rendered)],
                        &request_id(),
                    ))
                }
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "Publish" => publish(&state, &params),
        other => wire_error(SERVICE, "ValidationException", &format!("unknown action {other}")),
    }
}

fn subscribe(state: &ServerState, params: &FormParams) -> Response {
    let name = name_from_arn(params);
    let protocol = match SubscriptionProtocol::parse(params.get("Protocol").unwrap_or_default())
    {
        Ok(protocol) => protocol,
        Err(err) => return engine_error(SERVICE, &err),
    };
    let endpoint = params.get("Endpoint").unwrap_or_default();
    // Filter policies arrive as a JSON attribute of the subscription.
    let filter_policy = params
        .get("Attributes.entry.1.key")
        .filter(|k| *k == "FilterPolicy")
        .and_then(|_| params.get("Attributes.entry.1.value"))
        .and_then(|raw| serde_json::from_str(raw).ok());
    match state.engines.topics.subscribe(&name, protocol, endpoint, filter_policy) {
        Ok(sub_arn) => xml_response(action_response(
            "Subscribe",
            vec![Xml::text("SubscriptionArn", sub_arn)],
            &request_id(),
        )),
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn publish(state: &ServerState, params: &FormParams) -> Response {
    let name = name_from_arn(params);
    let request = PublishRequest {
        message: params.get("Message").unwrap_or_default().to_string(),
        subject: params.get("Subject").map(str::to_string),
        attributes: parse_message_attributes(params),
    };
    match state.engines.topics.publish(&name, request) {
        Ok(message_id) => xml_response(action_response(
            "Publish",
            vec![Xml::text("MessageId", message_id)],
            &request_id(),
        )),
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn parse_message_attributes(params: &FormParams) -> HashMap<String, MessageAttr> {
    numbered_entries(params, "MessageAttributes")
        .into_iter()
        .chain(numbered_entries(params, "MessageAttribute"))
        .filter_map(|entry| {
            let name = entry.get("Name").or_else(|| entry.get("key"))?.clone();
            let data_type = entry
                .get("Value.DataType")
                .or_else(|| entry.get("value.DataType"))
                .cloned()
                .unwrap_or_else(|| "String".to_string());
            let string_value = entry
                .get("Value.StringValue")
                .or_else(|| entry.get("value.StringValue"))
                .cloned();
            Some((name, MessageAttr { data_type, string_value }))
        })
        .collect()
}

fn name_from_arn(params: &FormParams) -> String {
    let arn = params.get("TopicArn").unwrap_or_default();
    lws_core::arn::leaf_name(name_from_url(arn)).to_string()
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
