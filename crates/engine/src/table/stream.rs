// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-stream dispatcher.
//!
//! Table mutations emit records onto an unbounded FIFO; a background
//! loop gathers them into time/size-bounded windows, groups by table,
//! and delivers batches to every subscriber concurrently. One
//! subscriber failing or stalling never blocks its peers or the next
//! window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{join_all, BoxFuture};
use indexmap::IndexMap;
use lws_config::StreamView;
use lws_core::{EngineError, Item};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Default batching window.
pub const BATCH_WINDOW: Duration = Duration::from_millis(100);
/// Default maximum records per batch.
pub const MAX_BATCH: usize = 100;

/// Kind of data change a record observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Modify,
    Remove,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Modify => "MODIFY",
            ChangeKind::Remove => "REMOVE",
        }
    }
}

/// One observation of a data change, images already view-filtered.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub event_id: String,
    pub kind: ChangeKind,
    pub table: String,
    pub keys: Item,
    pub new_image: Option<Item>,
    pub old_image: Option<Item>,
    pub sequence_number: u64,
    pub created_epoch_ms: u64,
}

/// Receives batches of change records for one table.
pub type StreamSubscriber =
    Arc<dyn Fn(Vec<ChangeRecord>) -> BoxFuture<'static, Result<(), EngineError>> + Send + Sync>;

pub struct StreamDispatcher {
    window: Duration,
    max_batch: usize,
    tx: mpsc::UnboundedSender<ChangeRecord>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<ChangeRecord>>>,
    subscribers: RwLock<HashMap<String, Vec<StreamSubscriber>>>,
    sequence: AtomicU64,
    cancel: CancellationToken,
}

impl StreamDispatcher {
    pub fn new(window: Duration, max_batch: usize) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            window,
            max_batch,
            tx,
            rx: Mutex::new(Some(rx)),
            subscribers: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_defaults() -> Arc<Self> {
        Self::new(BATCH_WINDOW, MAX_BATCH)
    }

    /// Register a subscriber for one table's records.
    pub fn subscribe(&self, table: &str, subscriber: StreamSubscriber) {
        self.subscribers.write().entry(table.to_string()).or_default().push(subscriber);
    }

    pub fn has_subscribers(&self, table: &str) -> bool {
        self.subscribers.read().get(table).is_some_and(|subs| !subs.is_empty())
    }

    /// Build and enqueue a record. Records for tables nobody listens
    /// to are dropped at the source.
    pub fn emit(
        &self,
        kind: ChangeKind,
        table: &str,
        keys: Item,
        new_image: Option<Item>,
        old_image: Option<Item>,
        view: StreamView,
        created_epoch_ms: u64,
    ) {
        if !self.has_subscribers(table) {
            return;
        }
        let record = ChangeRecord {
            event_id: Uuid::new_v4().to_string(),
            kind,
            table: table.to_string(),
            keys,
            new_image: filter_image(new_image, view, true),
            old_image: filter_image(old_image, view, false),
            sequence_number: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            created_epoch_ms,
        };
        let _ = self.tx.send(record);
    }

    /// Spawn the background flush loop. Call once at startup.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let receiver = self.rx.lock().take();
        tokio::spawn(async move {
            let Some(rx) = receiver else {
                tracing::warn!("stream dispatcher started twice");
                return;
            };
            self.run(rx).await;
        })
    }

    /// Signal the flush loop to stop after draining what it holds.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn run(&self, mut rx: mpsc::UnboundedReceiver<ChangeRecord>) {
        let mut pending: Vec<ChangeRecord> = Vec::new();
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            self.collect_window(&mut rx, &mut pending).await;
            // Drain stragglers that arrived as the window closed.
            while let Ok(record) = rx.try_recv() {
                pending.push(record);
            }
            if !pending.is_empty() {
                self.dispatch(std::mem::take(&mut pending)).await;
            }
        }
        // Final drain so shutdown does not lose accepted records.
        while let Ok(record) = rx.try_recv() {
            pending.push(record);
        }
        if !pending.is_empty() {
            self.dispatch(pending).await;
        }
    }

    /// Pull records until the window elapses or the accumulator fills.
    async fn collect_window(
        &self,
        rx: &mut mpsc::UnboundedReceiver<ChangeRecord>,
        pending: &mut Vec<ChangeRecord>,
    ) {
        let deadline = tokio::time::Instant::now() + self.window;
        loop {
            if pending.len() >= self.max_batch {
                return;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep_until(deadline) => return,
                received = rx.recv() => match received {
                    Some(record) => pending.push(record),
                    None => return,
                },
            }
        }
    }

    async fn dispatch(&self, records: Vec<ChangeRecord>) {
        let mut by_table: IndexMap<String, Vec<ChangeRecord>> = IndexMap::new();
        for record in records {
            by_table.entry(record.table.clone()).or_default().push(record);
        }

        let mut deliveries = Vec::new();
        for (table, mut table_records) in by_table {
            table_records.sort_by_key(|r| r.sequence_number);
            let subscribers = match self.subscribers.read().get(&table) {
                Some(subs) => subs.clone(),
                None => continue,
            };
            let batches: Vec<Vec<ChangeRecord>> =
                table_records.chunks(self.max_batch).map(<[ChangeRecord]>::to_vec).collect();
            for subscriber in subscribers {
                // Subscribers run concurrently; each subscriber sees
                // its batches strictly in sequence order.
                let batches = batches.clone();
                let table = table.clone();
                deliveries.push(async move {
                    for batch in batches {
                        if let Err(err) = subscriber(batch).await {
                            tracing::error!(table = %table, error = %err, "stream subscriber failed");
                        }
                    }
                });
            }
        }
        join_all(deliveries).await;
    }
}

fn filter_image(image: Option<Item>, view: StreamView, is_new: bool) -> Option<Item> {
    match view {
        StreamView::KeysOnly => None,
        StreamView::NewImage => image.filter(|_| is_new),
        StreamView::OldImage => image.filter(|_| !is_new),
        StreamView::NewAndOld => image,
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
