// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup wiring: change-stream subscribers and bucket notification
//! handlers derived from the configuration document.

use std::sync::Arc;

use lws_config::{BucketSpec, EventSourceKind, EventSourceMappingSpec, StreamView};
use lws_core::{arn, iso8601_ms, Clock};
use serde_json::{json, Value};

use crate::compute::ComputeEngine;
use crate::object::{ObjectEvent, ObjectStoreEngine};
use crate::table::{ChangeRecord, TableEngine};

/// Register a change-stream subscriber for every enabled table-stream
/// mapping.
pub fn register_stream_subscribers<C: Clock>(
    tables: &TableEngine<C>,
    compute: Arc<ComputeEngine>,
    mappings: &[EventSourceMappingSpec],
) {
    for mapping in mappings {
        if mapping.kind != EventSourceKind::TableStream || !mapping.enabled {
            continue;
        }
        let view = tables.stream_view(&mapping.source).unwrap_or(StreamView::NewAndOld);
        let function = mapping.function.clone();
        let compute = compute.clone();
        tables.stream().subscribe(
            &mapping.source,
            Arc::new(move |batch: Vec<ChangeRecord>| {
                let compute = compute.clone();
                let function = function.clone();
                let event = stream_records_event(&batch, view);
                Box::pin(async move { compute.invoke(&function, event).await.map(|_| ()) })
            }),
        );
    }
}

/// Register configured bucket notification handlers.
pub fn register_bucket_notifications<C: Clock>(
    objects: &ObjectStoreEngine<C>,
    compute: Arc<ComputeEngine>,
    buckets: &[BucketSpec],
) {
    for bucket in buckets {
        for notification in &bucket.notifications {
            let compute = compute.clone();
            let function = notification.function.clone();
            let result = objects.register_notification(
                &bucket.name,
                &notification.events,
                &notification.prefix,
                &notification.suffix,
                Arc::new(move |event: ObjectEvent| {
                    let compute = compute.clone();
                    let function = function.clone();
                    let payload = object_records_event(&event);
                    Box::pin(async move { compute.invoke(&function, payload).await.map(|_| ()) })
                }),
            );
            if let Err(err) = result {
                tracing::warn!(bucket = %bucket.name, error = %err, "notification wiring failed");
            }
        }
    }
}

/// The records event a change-stream batch hands to compute.
pub fn stream_records_event(batch: &[ChangeRecord], view: StreamView) -> Value {
    let records: Vec<Value> = batch
        .iter()
        .map(|record| {
            let mut dynamodb = json!({
                "Keys": serde_json::to_value(&record.keys).unwrap_or_default(),
                "SequenceNumber": record.sequence_number.to_string(),
                "SizeBytes": 0,
                "StreamViewType": stream_view_name(view),
                "ApproximateCreationDateTime": record.created_epoch_ms / 1000,
            });
            if let Some(new_image) = &record.new_image {
                dynamodb["NewImage"] = serde_json::to_value(new_image).unwrap_or_default();
            }
            if let Some(old_image) = &record.old_image {
                dynamodb["OldImage"] = serde_json::to_value(old_image).unwrap_or_default();
            }
            json!({
                "eventID": record.event_id,
                "eventName": record.kind.as_str(),
                "eventVersion": "1.1",
                "eventSource": "aws:dynamodb",
                "awsRegion": arn::REGION,
                "dynamodb": dynamodb,
                "eventSourceARN": arn::table_stream(&record.table),
            })
        })
        .collect();
    json!({ "Records": records })
}

/// The single-record event a bucket notification hands to compute.
pub fn object_records_event(event: &ObjectEvent) -> Value {
    json!({
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "awsRegion": arn::REGION,
            "eventTime": iso8601_ms(event.epoch_ms),
            "eventName": event.event_type,
            "s3": {
                "bucket": {
                    "name": event.bucket,
                    "arn": arn::bucket(&event.bucket),
                },
                "object": {
                    "key": event.key,
                    "size": event.size,
                },
            },
        }]
    })
}

fn stream_view_name(view: StreamView) -> &'static str {
    match view {
        StreamView::KeysOnly => "KEYS_ONLY",
        StreamView::NewImage => "NEW_IMAGE",
        StreamView::OldImage => "OLD_IMAGE",
        StreamView::NewAndOld => "NEW_AND_OLD_IMAGES",
    }
}
