// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue event-source pollers.
//!
//! One background loop per enabled mapping: long-poll the queue,
//! invoke the target function with a records event, delete the batch
//! on success. On failure the messages are left alone; the visibility
//! timeout brings them back.

use std::sync::Arc;
use std::time::Duration;

use lws_config::{EventSourceKind, EventSourceMappingSpec};
use lws_core::{arn, Clock};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::Fabric;
use crate::queue::ReceivedMessage;

/// Long-poll wait used by the pollers.
pub const POLL_WAIT: Duration = Duration::from_secs(2);

/// Spawn a poller task per enabled queue mapping.
pub fn start_queue_pollers<C: Clock>(
    fabric: &Arc<Fabric<C>>,
    mappings: &[EventSourceMappingSpec],
    cancel: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    mappings
        .iter()
        .filter(|mapping| mapping.kind == EventSourceKind::Queue && mapping.enabled)
        .map(|mapping| {
            let fabric = fabric.clone();
            let mapping = mapping.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                poll_loop(fabric, mapping, cancel).await;
            })
        })
        .collect()
}

async fn poll_loop<C: Clock>(
    fabric: Arc<Fabric<C>>,
    mapping: EventSourceMappingSpec,
    cancel: CancellationToken,
) {
    tracing::debug!(queue = %mapping.source, function = %mapping.function, "poller started");
    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = fabric.queues.receive(&mapping.source, mapping.batch_size, POLL_WAIT) => received,
        };
        match received {
            Ok(messages) if !messages.is_empty() => {
                deliver_batch(&fabric, &mapping, messages).await;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(queue = %mapping.source, error = %err, "poller receive failed");
                // Back off instead of spinning on a missing queue.
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(POLL_WAIT) => {}
                }
            }
        }
    }
    tracing::debug!(queue = %mapping.source, "poller stopped");
}

async fn deliver_batch<C: Clock>(
    fabric: &Arc<Fabric<C>>,
    mapping: &EventSourceMappingSpec,
    messages: Vec<ReceivedMessage>,
) {
    let event = queue_records_event(&mapping.source, &messages);
    match fabric.compute.invoke(&mapping.function, event).await {
        Ok(_) => {
            for message in &messages {
                if let Err(err) = fabric.queues.delete(&mapping.source, &message.receipt_handle) {
                    tracing::warn!(queue = %mapping.source, error = %err, "poller delete failed");
                }
            }
        }
        Err(err) => {
            // Leave the batch in flight; redelivery happens when the
            // visibility window lapses.
            tracing::warn!(
                queue = %mapping.source,
                function = %mapping.function,
                error = %err,
                "poller invocation failed"
            );
        }
    }
}

/// The records-array event a queue mapping hands to compute.
pub fn queue_records_event(queue_name: &str, messages: &[ReceivedMessage]) -> Value {
    let records: Vec<Value> = messages
        .iter()
        .map(|message| {
            let attributes: serde_json::Map<String, Value> = message
                .attributes
                .iter()
                .map(|(name, attr)| {
                    (
                        name.clone(),
                        json!({
                            "dataType": attr.data_type,
                            "stringValue": attr.string_value,
                        }),
                    )
                })
                .collect();
            json!({
                "messageId": message.message_id,
                "receiptHandle": message.receipt_handle,
                "body": message.body,
                "attributes": {
                    "ApproximateReceiveCount": message.receive_count.to_string(),
                    "SentTimestamp": message.sent_epoch_ms.to_string(),
                },
                "messageAttributes": Value::Object(attributes),
                "eventSource": "aws:sqs",
                "eventSourceARN": arn::queue(queue_name),
                "awsRegion": arn::REGION,
            })
        })
        .collect();
    json!({ "Records": records })
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
