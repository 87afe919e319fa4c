// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chaos injection.
//!
//! Injected errors use the service's native wire format, so a client
//! cannot tell a chaos failure from a real one. That is the point.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::state::ServerState;

/// How long a simulated timeout stalls before answering.
const TIMEOUT_STALL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChaosConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub error_rate: f64,
    #[serde(default)]
    pub latency_min_ms: u64,
    #[serde(default)]
    pub latency_max_ms: u64,
    #[serde(default)]
    pub errors: Vec<ChaosErrorSpec>,
    #[serde(default)]
    pub connection_reset_rate: f64,
    #[serde(default)]
    pub timeout_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosErrorSpec {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub status_code: Option<u16>,
}

fn default_weight() -> f64 {
    1.0
}

/// Per-service chaos configurations, updated through the control
/// plane.
#[derive(Default)]
pub struct ChaosStore {
    configs: RwLock<HashMap<String, ChaosConfig>>,
}

impl ChaosStore {
    pub fn set(&self, service: &str, config: ChaosConfig) {
        self.configs.write().insert(service.to_string(), config);
    }

    pub fn get(&self, service: &str) -> Option<ChaosConfig> {
        self.configs.read().get(service).cloned()
    }

    pub fn all(&self) -> HashMap<String, ChaosConfig> {
        self.configs.read().clone()
    }
}

pub async fn layer(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    if super::is_management(request.uri().path()) {
        return next.run(request).await;
    }
    let Some(chaos) = state.chaos.get(state.service).filter(|c| c.enabled) else {
        return next.run(request).await;
    };

    if roll(chaos.connection_reset_rate) {
        tracing::debug!(service = %state.service, "chaos: connection reset");
        return reset_response();
    }

    if roll(chaos.timeout_rate) {
        tracing::debug!(service = %state.service, "chaos: timeout");
        tokio::time::sleep(TIMEOUT_STALL).await;
        return error_response(
            state.service,
            &ChaosErrorSpec {
                error_type: "ServiceUnavailableException".to_string(),
                message: "chaos: request timed out".to_string(),
                weight: 1.0,
                status_code: Some(504),
            },
        );
    }

    if chaos.latency_max_ms > chaos.latency_min_ms {
        let delay = rand::thread_rng().gen_range(chaos.latency_min_ms..=chaos.latency_max_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    } else if chaos.latency_min_ms > 0 {
        tokio::time::sleep(Duration::from_millis(chaos.latency_min_ms)).await;
    }

    if roll(chaos.error_rate) {
        let spec = pick_error(&chaos);
        tracing::debug!(service = %state.service, error = %spec.error_type, "chaos: injected error");
        return error_response(state.service, &spec);
    }

    next.run(request).await
}

fn roll(rate: f64) -> bool {
    rate > 0.0 && rand::thread_rng().gen::<f64>() < rate
}

/// Weighted pick over the configured errors; a missing catalog
/// defaults to an internal error.
fn pick_error(chaos: &ChaosConfig) -> ChaosErrorSpec {
    if chaos.errors.is_empty() {
        return ChaosErrorSpec {
            error_type: "InternalServerError".to_string(),
            message: "chaos: injected error".to_string(),
            weight: 1.0,
            status_code: Some(500),
        };
    }
    let total: f64 = chaos.errors.iter().map(|e| e.weight).sum();
    let mut roll = rand::thread_rng().gen::<f64>() * total.max(f64::MIN_POSITIVE);
    for spec in &chaos.errors {
        roll -= spec.weight;
        if roll < 0.0 {
            return spec.clone();
        }
    }
    chaos.errors[chaos.errors.len() - 1].clone()
}

fn error_response(service: &str, spec: &ChaosErrorSpec) -> Response {
    let format = lws_wire::ErrorFormat::for_service(service);
    let mut wire = lws_wire::format_error(&spec.error_type, &spec.message, format);
    if let Some(status) = spec.status_code {
        wire.status = status;
    }
    Response::builder()
        .status(StatusCode::from_u16(wire.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        .header("content-type", wire.content_type)
        .body(Body::from(wire.body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Closest emulation of a connection reset the HTTP layer allows: the
/// body stream errors out mid-response, which hyper surfaces as an
/// aborted connection.
fn reset_response() -> Response {
    let stream = futures_util::stream::once(async {
        Err::<axum::body::Bytes, std::io::Error>(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "chaos: connection reset",
        ))
    });
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}
