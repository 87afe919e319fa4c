// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bucket notification matching and asynchronous dispatch.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use lws_core::EngineError;

/// A single object-store event.
#[derive(Debug, Clone)]
pub struct ObjectEvent {
    pub event_type: String,
    pub bucket: String,
    pub key: String,
    pub size: usize,
    pub epoch_ms: u64,
}

/// Receives one matching event.
pub type NotificationHandler =
    Arc<dyn Fn(ObjectEvent) -> BoxFuture<'static, Result<(), EngineError>> + Send + Sync>;

/// A registered notification subscription.
pub struct NotificationSub {
    pub event_glob: String,
    pub prefix: String,
    pub suffix: String,
    pub handler: NotificationHandler,
}

impl NotificationSub {
    fn matches(&self, event: &ObjectEvent) -> bool {
        match_event_glob(&self.event_glob, &event.event_type)
            && event.key.starts_with(&self.prefix)
            && event.key.ends_with(&self.suffix)
    }
}

/// `ObjectCreated:*` matches `ObjectCreated:Put`; without a trailing
/// `*` the match is exact.
pub fn match_event_glob(glob: &str, event_type: &str) -> bool {
    match glob.strip_suffix('*') {
        Some(prefix) => event_type.starts_with(prefix),
        None => glob == event_type,
    }
}

/// Fire matching handlers asynchronously; failures log and are
/// otherwise dropped.
pub fn dispatch(subscriptions: &[NotificationSub], event: ObjectEvent) {
    for sub in subscriptions {
        if !sub.matches(&event) {
            continue;
        }
        let handler = Arc::clone(&sub.handler);
        let event = event.clone();
        tokio::spawn(async move {
            let key = event.key.clone();
            let event_type = event.event_type.clone();
            if let Err(err) = handler(event).await {
                tracing::error!(%key, %event_type, error = %err, "bucket notification failed");
            }
        });
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
