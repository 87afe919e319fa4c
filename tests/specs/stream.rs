// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table change-stream delivery.

use std::sync::Arc;
use std::time::Duration;

use lws_config::{KeyAttributeSpec, StreamView, TableSpec};
use lws_core::FakeClock;
use lws_engine::table::{ChangeKind, ChangeRecord, StreamDispatcher, TableEngine};
use parking_lot::Mutex;

use crate::prelude::*;

fn users_table() -> TableSpec {
    TableSpec {
        name: "U".to_string(),
        partition_key: KeyAttributeSpec { name: "id".to_string(), attr_type: "S".to_string() },
        sort_key: None,
        indexes: vec![],
        stream_view: Some(StreamView::NewAndOld),
    }
}

struct Recorder {
    records: Mutex<Vec<ChangeRecord>>,
    notify: tokio::sync::Notify,
}

impl Recorder {
    fn new() -> Arc<Self> {
        Arc::new(Self { records: Mutex::new(Vec::new()), notify: tokio::sync::Notify::new() })
    }

    async fn wait_for(&self, count: usize) -> Vec<ChangeRecord> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let current = self.records.lock().clone();
            if current.len() >= count {
                return current;
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            assert!(!remaining.is_zero(), "timed out waiting for change records");
            let _ = tokio::time::timeout(remaining, self.notify.notified()).await;
        }
    }
}

#[tokio::test]
async fn put_put_delete_yields_ordered_insert_modify_remove() {
    let stream = StreamDispatcher::new(Duration::from_millis(20), 100);
    let tables = TableEngine::from_config(&[users_table()], FakeClock::new(), stream.clone());

    let recorder = Recorder::new();
    {
        let recorder = recorder.clone();
        stream.subscribe(
            "U",
            Arc::new(move |batch| {
                let recorder = recorder.clone();
                Box::pin(async move {
                    recorder.records.lock().extend(batch);
                    recorder.notify.notify_waiters();
                    Ok(())
                })
            }),
        );
    }
    let flush = stream.clone().start();

    tables.put("U", item(&[("id", AttrValue::s("1")), ("v", AttrValue::s("a"))])).unwrap();
    tables.put("U", item(&[("id", AttrValue::s("1")), ("v", AttrValue::s("b"))])).unwrap();
    tables.delete_item("U", &item(&[("id", AttrValue::s("1"))])).unwrap();

    let records = recorder.wait_for(3).await;
    assert_eq!(records.len(), 3, "exactly the three writes surfaced");

    assert_eq!(records[0].kind, ChangeKind::Insert);
    assert_eq!(records[0].new_image.as_ref().unwrap()["v"], AttrValue::s("a"));
    assert!(records[0].old_image.is_none());

    assert_eq!(records[1].kind, ChangeKind::Modify);
    assert_eq!(records[1].new_image.as_ref().unwrap()["v"], AttrValue::s("b"));
    assert_eq!(records[1].old_image.as_ref().unwrap()["v"], AttrValue::s("a"));

    assert_eq!(records[2].kind, ChangeKind::Remove);
    assert!(records[2].new_image.is_none());
    assert_eq!(records[2].old_image.as_ref().unwrap()["v"], AttrValue::s("b"));

    let sequences: Vec<u64> = records.iter().map(|r| r.sequence_number).collect();
    assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));

    stream.shutdown();
    let _ = flush.await;
}

#[tokio::test]
async fn n_writes_surface_exactly_n_records() {
    let stream = StreamDispatcher::new(Duration::from_millis(10), 4);
    let tables = TableEngine::from_config(&[users_table()], FakeClock::new(), stream.clone());
    let recorder = Recorder::new();
    {
        let recorder = recorder.clone();
        stream.subscribe(
            "U",
            Arc::new(move |batch| {
                let recorder = recorder.clone();
                Box::pin(async move {
                    recorder.records.lock().extend(batch);
                    recorder.notify.notify_waiters();
                    Ok(())
                })
            }),
        );
    }
    let flush = stream.clone().start();

    const WRITES: usize = 25;
    for i in 0..WRITES {
        tables.put("U", item(&[("id", AttrValue::s(format!("{i}")))])).unwrap();
    }

    let records = recorder.wait_for(WRITES).await;
    assert_eq!(records.len(), WRITES);
    let sequences: Vec<u64> = records.iter().map(|r| r.sequence_number).collect();
    assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]), "sequence order broke");

    stream.shutdown();
    let _ = flush.await;
}
