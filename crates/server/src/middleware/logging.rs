// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request logging and the multicast log hub.
//!
//! The hub is a broadcast channel: slow subscribers lag and lose the
//! oldest records rather than ever blocking request handling.

use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use lws_core::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::extract::{self, ExtractedOperation, RequestBytes};
use crate::state::ServerState;

/// Longest body slice kept in a log record.
pub const BODY_LOG_LIMIT: usize = 2048;

/// Per-subscriber buffered records before the oldest drop.
const HUB_CAPACITY: usize = 256;

/// One structured request record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp_ms: u64,
    pub service: String,
    pub method: String,
    pub path: String,
    pub operation: Option<String>,
    pub duration_ms: u64,
    pub status_code: u16,
    pub request_body: String,
    pub response_body: String,
}

/// Process-wide log multicast. Created by the supervisor at startup
/// and dropped at shutdown.
pub struct LogHub {
    tx: broadcast::Sender<LogRecord>,
}

impl LogHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogRecord> {
        self.tx.subscribe()
    }

    pub fn publish(&self, record: LogRecord) {
        tracing::info!(
            target: "lws::request",
            service = %record.service,
            method = %record.method,
            path = %record.path,
            operation = record.operation.as_deref().unwrap_or("-"),
            status = record.status_code,
            duration_ms = record.duration_ms,
            "request"
        );
        // No subscribers is fine.
        let _ = self.tx.send(record);
    }
}

impl Default for LogHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Outermost layer: buffers the body, extracts the operation name,
/// times the handler, publishes the record.
pub async fn layer(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();

    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let operation =
        extract::extract(state.service, &parts.method, &parts.uri, &parts.headers, &bytes);

    let mut request = Request::from_parts(parts, Body::from(bytes.clone()));
    request.extensions_mut().insert(ExtractedOperation(operation.clone()));
    request.extensions_mut().insert(RequestBytes(bytes.clone()));

    let response = next.run(request).await;

    let status_code = response.status().as_u16();
    let (response_parts, response_body) = response.into_parts();
    let response_bytes = to_bytes(response_body, usize::MAX).await.unwrap_or_default();

    state.log_hub.publish(LogRecord {
        timestamp_ms: SystemClock.epoch_ms(),
        service: state.service.to_string(),
        method,
        path,
        operation,
        duration_ms: started.elapsed().as_millis() as u64,
        status_code,
        request_body: truncate(&bytes),
        response_body: truncate(&response_bytes),
    });

    Response::from_parts(response_parts, Body::from(response_bytes))
}

fn truncate(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.char_indices().nth(BODY_LOG_LIMIT) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.into_owned(),
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
