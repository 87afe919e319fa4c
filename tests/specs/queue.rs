// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue basics: send, receive, visibility, redelivery.

use std::time::Duration;

use lws_engine::queue::SendRequest;

use crate::prelude::*;

#[tokio::test]
async fn send_receive_visibility_cycle() {
    let rig = rig(&[queue_spec("q1")], &[]);

    rig.queues
        .send("q1", SendRequest { body: "hello".to_string(), ..Default::default() })
        .unwrap();

    let first = rig.queues.receive("q1", 1, NO_WAIT).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].body, "hello");
    assert_eq!(first[0].receive_count, 1);

    // Within the visibility window the message is hidden.
    assert!(rig.queues.receive("q1", 1, NO_WAIT).await.unwrap().is_empty());

    // Past the default 30 s window it is redelivered, count bumped.
    rig.clock.advance(Duration::from_secs(31));
    let second = rig.queues.receive("q1", 1, NO_WAIT).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].body, "hello");
    assert_eq!(second[0].receive_count, 2);
}

#[tokio::test]
async fn deleted_message_is_never_redelivered() {
    let rig = rig(&[queue_spec("q1")], &[]);
    rig.queues
        .send("q1", SendRequest { body: "once".to_string(), ..Default::default() })
        .unwrap();
    let received = rig.queues.receive("q1", 1, NO_WAIT).await.unwrap();
    rig.queues.delete("q1", &received[0].receipt_handle).unwrap();

    rig.clock.advance(Duration::from_secs(60));
    assert!(rig.queues.receive("q1", 1, NO_WAIT).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_receivers_get_disjoint_messages() {
    let rig = rig(&[queue_spec("q1")], &[]);
    for i in 0..10 {
        rig.queues
            .send("q1", SendRequest { body: format!("m{i}"), ..Default::default() })
            .unwrap();
    }
    let a = rig.queues.receive("q1", 5, NO_WAIT).await.unwrap();
    let b = rig.queues.receive("q1", 5, NO_WAIT).await.unwrap();
    let mut ids: Vec<String> =
        a.iter().chain(b.iter()).map(|m| m.message_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10, "the two receives overlapped");
}
