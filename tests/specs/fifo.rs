// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIFO dedup and group isolation.

use std::time::Duration;

use lws_config::QueueSpec;
use lws_engine::queue::SendRequest;

use crate::prelude::*;

fn fifo_spec(content_dedup: bool) -> QueueSpec {
    QueueSpec { content_based_dedup: content_dedup, ..queue_spec("q.fifo") }
}

fn grouped(body: &str, group: &str) -> SendRequest {
    SendRequest {
        body: body.to_string(),
        group_id: Some(group.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn content_dedup_collapses_identical_sends() {
    let rig = rig(&[fifo_spec(true)], &[]);

    let first = rig.queues.send("q.fifo", grouped("X", "g1")).unwrap();
    let second = rig.queues.send("q.fifo", grouped("X", "g1")).unwrap();
    assert_eq!(first.message_id, second.message_id);

    let received = rig.queues.receive("q.fifo", 10, NO_WAIT).await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body, "X");
}

#[tokio::test]
async fn dedup_window_expires() {
    let rig = rig(&[fifo_spec(true)], &[]);
    let first = rig.queues.send("q.fifo", grouped("X", "g1")).unwrap();
    rig.clock.advance(Duration::from_secs(301));
    let second = rig.queues.send("q.fifo", grouped("X", "g1")).unwrap();
    assert_ne!(first.message_id, second.message_id);
}

#[tokio::test]
async fn in_flight_group_blocks_until_delete_or_expiry() {
    let rig = rig(&[fifo_spec(false)], &[]);
    rig.queues
        .send("q.fifo", SendRequest { dedup_id: Some("d1".to_string()), ..grouped("m1", "g") })
        .unwrap();
    rig.queues
        .send("q.fifo", SendRequest { dedup_id: Some("d2".to_string()), ..grouped("m2", "g") })
        .unwrap();

    let first = rig.queues.receive("q.fifo", 1, NO_WAIT).await.unwrap();
    assert_eq!(first[0].body, "m1");

    // m2 shares the group with the in-flight m1.
    assert!(rig.queues.receive("q.fifo", 1, NO_WAIT).await.unwrap().is_empty());

    rig.queues.delete("q.fifo", &first[0].receipt_handle).unwrap();
    let second = rig.queues.receive("q.fifo", 1, NO_WAIT).await.unwrap();
    assert_eq!(second[0].body, "m2");

    // Expiry also unblocks: receive m2 again after its window lapses.
    rig.clock.advance(Duration::from_secs(31));
    let third = rig.queues.receive("q.fifo", 1, NO_WAIT).await.unwrap();
    assert_eq!(third[0].body, "m2");
    assert_eq!(third[0].receive_count, 2);
}
