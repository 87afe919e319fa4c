// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::compute::{ComputeEngine, RecordingRunner};
use crate::queue::{QueueEngine, SendRequest};
use lws_config::{EventSourceMappingSpec, FunctionSpec, QueueSpec};
use lws_core::SystemClock;
use std::collections::HashMap;

fn queue_spec(name: &str, visibility_secs: u64) -> QueueSpec {
    QueueSpec {
        name: name.to_string(),
        visibility_timeout_secs: visibility_secs,
        fifo: false,
        content_based_dedup: false,
        redrive: None,
        tags: HashMap::new(),
    }
}

fn function_spec(name: &str) -> FunctionSpec {
    FunctionSpec {
        name: name.to_string(),
        runtime: "nodejs20.x".to_string(),
        handler: "index.handler".to_string(),
        timeout_secs: 5,
        memory_mb: 128,
        env: HashMap::new(),
    }
}

fn mapping(queue: &str, function: &str, enabled: bool) -> EventSourceMappingSpec {
    EventSourceMappingSpec {
        kind: EventSourceKind::Queue,
        source: queue.to_string(),
        function: function.to_string(),
        batch_size: 10,
        enabled,
    }
}

struct Rig {
    fabric: Arc<Fabric<SystemClock>>,
    runner: Arc<RecordingRunner>,
    cancel: CancellationToken,
}

fn rig(visibility_secs: u64) -> Rig {
    let queues = Arc::new(QueueEngine::from_config(
        &[queue_spec("orders", visibility_secs)],
        SystemClock,
    ));
    let runner = RecordingRunner::new();
    let compute = Arc::new(ComputeEngine::new(vec![function_spec("worker")], runner.clone()));
    Rig { fabric: Fabric::new(queues, compute), runner, cancel: CancellationToken::new() }
}

#[tokio::test]
async fn poller_invokes_and_deletes_on_success() {
    let rig = rig(30);
    rig.fabric
        .queues
        .send("orders", SendRequest { body: "job-1".to_string(), ..Default::default() })
        .unwrap();

    let handles =
        start_queue_pollers(&rig.fabric, &[mapping("orders", "worker", true)], rig.cancel.clone());
    assert!(rig.runner.wait_for(1, Duration::from_secs(5)).await);

    let events = rig.runner.invocations_of("worker");
    let records = events[0]["Records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["body"], "job-1");
    assert_eq!(records[0]["eventSource"], "aws:sqs");
    assert_eq!(records[0]["eventSourceARN"], "arn:aws:sqs:us-east-1:000000000000:orders");

    // Deleted after the successful invocation.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let counts = rig.fabric.queues.attributes("orders").unwrap().counts;
        if counts.visible == 0 && counts.in_flight == 0 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "message was not deleted");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    rig.cancel.cancel();
    for handle in handles {
        let _ = handle.await;
    }
}

#[tokio::test]
async fn poller_leaves_messages_for_redelivery_on_failure() {
    let rig = rig(1);
    rig.runner.fail("worker");
    rig.fabric
        .queues
        .send("orders", SendRequest { body: "poison".to_string(), ..Default::default() })
        .unwrap();

    let handles =
        start_queue_pollers(&rig.fabric, &[mapping("orders", "worker", true)], rig.cancel.clone());
    // Failed invocation leaves the message in flight; after the
    // visibility window it is polled (and fails) again.
    assert!(rig.runner.wait_for(2, Duration::from_secs(5)).await);

    rig.cancel.cancel();
    for handle in handles {
        let _ = handle.await;
    }
}

#[tokio::test]
async fn disabled_mapping_spawns_no_loop() {
    let rig = rig(30);
    let handles =
        start_queue_pollers(&rig.fabric, &[mapping("orders", "worker", false)], rig.cancel.clone());
    assert!(handles.is_empty());
}

#[test]
fn records_event_shape() {
    use crate::queue::ReceivedMessage;
    let event = queue_records_event(
        "orders",
        &[ReceivedMessage {
            message_id: "m-1".to_string(),
            receipt_handle: "r-1".to_string(),
            body: "hello".to_string(),
            attributes: HashMap::new(),
            receive_count: 2,
            sent_epoch_ms: 1_000,
        }],
    );
    let record = &event["Records"][0];
    assert_eq!(record["messageId"], "m-1");
    assert_eq!(record["attributes"]["ApproximateReceiveCount"], "2");
    assert_eq!(record["attributes"]["SentTimestamp"], "1000");
    assert_eq!(record["awsRegion"], "us-east-1");
}
