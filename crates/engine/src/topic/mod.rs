// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic engine: pub/sub with filter policies.
//!
//! Publish never waits on deliveries: each matching subscription gets
//! its own dispatch task, and a failing target only shows up in the
//! logs.

pub mod filter;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lws_config::TopicSpec;
use lws_core::{arn, iso8601_ms, Clock, EngineError, MessageAttr};
use parking_lot::RwLock;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::fabric::Fabric;
use crate::queue::SendRequest;

/// Delivery protocol of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionProtocol {
    Queue,
    Compute,
}

impl SubscriptionProtocol {
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "queue" | "sqs" => Ok(SubscriptionProtocol::Queue),
            "compute" | "lambda" => Ok(SubscriptionProtocol::Compute),
            other => Err(EngineError::validation(format!("unsupported protocol '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Subscription {
    pub arn: String,
    pub protocol: SubscriptionProtocol,
    pub endpoint: String,
    pub filter_policy: Option<Value>,
}

struct Topic {
    name: String,
    arn: String,
    subscriptions: Vec<Subscription>,
}

/// A publish request.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub message: String,
    pub subject: Option<String>,
    pub attributes: HashMap<String, MessageAttr>,
}

pub struct TopicEngine<C: Clock> {
    clock: C,
    fabric: Arc<Fabric<C>>,
    topics: RwLock<HashMap<String, Topic>>,
}

impl<C: Clock> TopicEngine<C> {
    pub fn new(clock: C, fabric: Arc<Fabric<C>>) -> Self {
        Self { clock, fabric, topics: RwLock::new(HashMap::new()) }
    }

    pub fn from_config(
        specs: &[TopicSpec],
        clock: C,
        fabric: Arc<Fabric<C>>,
    ) -> Result<Self, EngineError> {
        let engine = Self::new(clock, fabric);
        for spec in specs {
            engine.create_topic(&spec.name)?;
            for sub in &spec.subscriptions {
                engine.subscribe(
                    &spec.name,
                    SubscriptionProtocol::parse(&sub.protocol)?,
                    &sub.endpoint,
                    sub.filter_policy.clone(),
                )?;
            }
        }
        Ok(engine)
    }

    pub fn create_topic(&self, name: &str) -> Result<String, EngineError> {
        let mut topics = self.topics.write();
        if topics.contains_key(name) {
            return Err(EngineError::already_exists("topic", name));
        }
        let topic_arn = arn::topic(name);
        topics.insert(
            name.to_string(),
            Topic { name: name.to_string(), arn: topic_arn.clone(), subscriptions: Vec::new() },
        );
        Ok(topic_arn)
    }

    pub fn delete_topic(&self, name: &str) -> Result<(), EngineError> {
        match self.topics.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("topic", name)),
        }
    }

    pub fn list_topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn topic_arn(&self, name: &str) -> Result<String, EngineError> {
        let topics = self.topics.read();
        let topic = topics.get(name).ok_or_else(|| EngineError::not_found("topic", name))?;
        Ok(topic.arn.clone())
    }

    /// Subscribe an endpoint; returns the subscription arn.
    pub fn subscribe(
        &self,
        topic_name: &str,
        protocol: SubscriptionProtocol,
        endpoint: &str,
        filter_policy: Option<Value>,
    ) -> Result<String, EngineError> {
        let mut topics = self.topics.write();
        let topic = topics
            .get_mut(topic_name)
            .ok_or_else(|| EngineError::not_found("topic", topic_name))?;
        let sub_arn = arn::subscription(topic_name, &Uuid::new_v4().to_string());
        topic.subscriptions.push(Subscription {
            arn: sub_arn.clone(),
            protocol,
            endpoint: endpoint.to_string(),
            filter_policy,
        });
        Ok(sub_arn)
    }

    pub fn unsubscribe(&self, subscription_arn: &str) -> Result<(), EngineError> {
        let mut topics = self.topics.write();
        for topic in topics.values_mut() {
            let before = topic.subscriptions.len();
            topic.subscriptions.retain(|sub| sub.arn != subscription_arn);
            if topic.subscriptions.len() != before {
                return Ok(());
            }
        }
        Err(EngineError::not_found("subscription", subscription_arn))
    }

    pub fn subscriptions(&self, topic_name: &str) -> Result<Vec<Subscription>, EngineError> {
        let topics = self.topics.read();
        let topic =
            topics.get(topic_name).ok_or_else(|| EngineError::not_found("topic", topic_name))?;
        Ok(topic.subscriptions.clone())
    }

    /// Publish to a topic; fan out to every matching subscription
    /// concurrently. Returns the message id.
    pub fn publish(
        &self,
        topic_name: &str,
        request: PublishRequest,
    ) -> Result<String, EngineError> {
        let (topic_arn, matching) = {
            let topics = self.topics.read();
            let topic = topics
                .get(topic_name)
                .ok_or_else(|| EngineError::not_found("topic", topic_name))?;
            let matching: Vec<Subscription> = topic
                .subscriptions
                .iter()
                .filter(|sub| matches_policy(sub.filter_policy.as_ref(), &request.attributes))
                .cloned()
                .collect();
            (topic.arn.clone(), matching)
        };

        let message_id = Uuid::new_v4().to_string();
        let envelope = notification_envelope(
            &topic_arn,
            &message_id,
            request.subject.as_deref(),
            &request.message,
            &request.attributes,
            self.clock.epoch_ms(),
        );

        for sub in matching {
            let fabric = self.fabric.clone();
            let envelope = envelope.clone();
            let message_id = message_id.clone();
            tokio::spawn(async move {
                if let Err(err) = deliver(&fabric, &sub, envelope).await {
                    tracing::error!(
                        message_id = %message_id,
                        endpoint = %sub.endpoint,
                        error = %err,
                        "topic delivery failed"
                    );
                }
            });
        }

        Ok(message_id)
    }
}

/// An empty or absent policy matches everything; otherwise every policy
/// attribute needs at least one matching spec.
fn matches_policy(policy: Option<&Value>, attributes: &HashMap<String, MessageAttr>) -> bool {
    let Some(Value::Object(policy)) = policy else {
        return true;
    };
    policy.iter().all(|(name, specs)| {
        let specs = match specs {
            Value::Array(specs) => specs.as_slice(),
            single => std::slice::from_ref(single),
        };
        let actual = attributes.get(name).and_then(attr_to_json);
        filter::match_spec_list(specs, actual.as_ref())
    })
}

fn attr_to_json(attr: &MessageAttr) -> Option<Value> {
    attr.string_value.as_ref().map(|value| Value::String(value.clone()))
}

async fn deliver<C: Clock>(
    fabric: &Fabric<C>,
    sub: &Subscription,
    envelope: Value,
) -> Result<(), EngineError> {
    match sub.protocol {
        SubscriptionProtocol::Queue => {
            let queue_name = arn::leaf_name(&sub.endpoint).to_string();
            fabric
                .queues
                .send(
                    &queue_name,
                    SendRequest {
                        body: envelope.to_string(),
                        delay: Duration::ZERO,
                        ..Default::default()
                    },
                )
                .map(|_| ())
        }
        SubscriptionProtocol::Compute => {
            let function = arn::leaf_name(&sub.endpoint).to_string();
            let event = records_event(&sub.arn, envelope);
            fabric.compute.invoke(&function, event).await.map(|_| ())
        }
    }
}

/// The standard notification envelope, used both as the queue body and
/// inside the compute records event.
fn notification_envelope(
    topic_arn: &str,
    message_id: &str,
    subject: Option<&str>,
    message: &str,
    attributes: &HashMap<String, MessageAttr>,
    epoch_ms: u64,
) -> Value {
    let mut rendered = serde_json::Map::new();
    for (name, attr) in attributes {
        rendered.insert(
            name.clone(),
            json!({
                "Type": attr.data_type,
                "Value": attr.string_value,
            }),
        );
    }
    json!({
        "Type": "Notification",
        "MessageId": message_id,
        "TopicArn": topic_arn,
        "Subject": subject,
        "Message": message,
        "Timestamp": iso8601_ms(epoch_ms),
        "MessageAttributes": Value::Object(rendered),
    })
}

fn records_event(subscription_arn: &str, envelope: Value) -> Value {
    json!({
        "Records": [{
            "EventSource": "aws:sns",
            "EventVersion": "1.0",
            "EventSubscriptionArn": subscription_arn,
            "Sns": envelope,
        }]
    })
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
