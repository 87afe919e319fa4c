// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic fan-out into queues and compute.

use lws_core::MessageAttr;
use lws_engine::topic::{PublishRequest, SubscriptionProtocol};

use crate::prelude::*;

#[tokio::test]
async fn publish_reaches_queue_subscription_with_envelope() {
    let rig = rig(&[queue_spec("Q")], &[]);
    rig.topics.create_topic("T").unwrap();
    rig.topics
        .subscribe("T", SubscriptionProtocol::Queue, "Q", None)
        .unwrap();

    rig.topics
        .publish("T", PublishRequest { message: "hello".to_string(), ..Default::default() })
        .unwrap();
    settle().await;

    let received = rig.queues.receive("Q", 1, NO_WAIT).await.unwrap();
    assert_eq!(received.len(), 1);
    let envelope: serde_json::Value = serde_json::from_str(&received[0].body).unwrap();
    assert_eq!(envelope["Type"], "Notification");
    assert_eq!(envelope["Message"], "hello");
    assert_eq!(envelope["TopicArn"], "arn:aws:sns:us-east-1:000000000000:T");
}

#[tokio::test]
async fn every_matching_subscription_gets_exactly_one_delivery() {
    let rig = rig(&[queue_spec("matched"), queue_spec("unmatched")], &["handler"]);
    rig.topics.create_topic("T").unwrap();
    rig.topics
        .subscribe(
            "T",
            SubscriptionProtocol::Queue,
            "matched",
            Some(serde_json::json!({"color": ["red"]})),
        )
        .unwrap();
    rig.topics
        .subscribe(
            "T",
            SubscriptionProtocol::Queue,
            "unmatched",
            Some(serde_json::json!({"color": ["blue"]})),
        )
        .unwrap();
    rig.topics
        .subscribe("T", SubscriptionProtocol::Compute, "handler", None)
        .unwrap();

    rig.topics
        .publish(
            "T",
            PublishRequest {
                message: "m".to_string(),
                attributes: [("color".to_string(), MessageAttr::string("red"))].into(),
                ..Default::default()
            },
        )
        .unwrap();
    settle().await;

    assert_eq!(rig.queues.receive("matched", 10, NO_WAIT).await.unwrap().len(), 1);
    assert!(rig.queues.receive("unmatched", 10, NO_WAIT).await.unwrap().is_empty());
    assert_eq!(rig.runner.invocations_of("handler").len(), 1);
}

#[tokio::test]
async fn publish_order_is_preserved_per_queue_subscriber() {
    let rig = rig(&[queue_spec("Q")], &[]);
    rig.topics.create_topic("T").unwrap();
    rig.topics
        .subscribe("T", SubscriptionProtocol::Queue, "Q", None)
        .unwrap();

    for i in 0..5 {
        rig.topics
            .publish("T", PublishRequest { message: format!("m{i}"), ..Default::default() })
            .unwrap();
        // Drain each dispatch before the next publish: per-subscriber
        // order across publishes is what the contract promises.
        settle().await;
    }

    let received = rig.queues.receive("Q", 10, NO_WAIT).await.unwrap();
    let bodies: Vec<String> = received
        .iter()
        .map(|m| {
            let envelope: serde_json::Value = serde_json::from_str(&m.body).unwrap();
            envelope["Message"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(bodies, ["m0", "m1", "m2", "m3", "m4"]);
}
