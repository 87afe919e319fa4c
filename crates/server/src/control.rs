// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane endpoints under `/_lws/`.
//!
//! Merged into every service router; the mock/auth/chaos layers skip
//! this prefix, so the CLI and tests can always reach them.

use std::collections::HashMap;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use crate::middleware::chaos::ChaosConfig;
use crate::middleware::mock::MockConfig;
use crate::state::ServerState;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/_lws/health", get(health))
        .route("/_lws/resources", get(resources))
        .route("/_lws/chaos", get(get_chaos).post(set_chaos))
        .route("/_lws/aws-mock", get(get_mocks).post(set_mock))
        .with_state(state)
}

async fn health(State(state): State<ServerState>) -> Json<Value> {
    let enabled: Vec<&str> = lws_config::SERVICES
        .iter()
        .copied()
        .filter(|service| state.config.service(service).enabled)
        .collect();
    Json(json!({ "status": "ok", "services": enabled }))
}

/// Inventory of enabled services, ports, and owned resources.
async fn resources(State(state): State<ServerState>) -> Json<Value> {
    let engines = &state.engines;
    let mut services = Vec::new();
    for service in lws_config::SERVICES {
        let settings = state.config.service(service);
        if !settings.enabled {
            continue;
        }
        let resources: Value = match *service {
            "sqs" => json!(engines.queues.list(None)),
            "dynamodb" => json!(engines.tables.list_tables()),
            "s3" => json!(engines.objects.list_buckets()),
            "sns" => json!(engines.topics.list_topics()),
            "events" => json!(engines.bus.list_buses()),
            "stepfunctions" => {
                json!(engines
                    .sfn
                    .list_state_machines()
                    .into_iter()
                    .map(|(name, _)| name)
                    .collect::<Vec<_>>())
            }
            "ssm" => json!(engines.params.list_names()),
            "secretsmanager" => {
                json!(engines.secrets.list().into_iter().map(|s| s.name).collect::<Vec<_>>())
            }
            "cognito-idp" => {
                json!(engines
                    .identity
                    .list_users()
                    .into_iter()
                    .map(|u| u.username)
                    .collect::<Vec<_>>())
            }
            _ => json!([]),
        };
        services.push(json!({
            "service": service,
            "port": settings.port,
            "resources": resources,
        }));
    }
    Json(json!({ "services": services }))
}

async fn get_chaos(State(state): State<ServerState>) -> Json<HashMap<String, ChaosConfig>> {
    Json(state.chaos.all())
}

/// Replace chaos configuration for the services named in the body.
async fn set_chaos(
    State(state): State<ServerState>,
    Json(configs): Json<HashMap<String, ChaosConfig>>,
) -> Json<Value> {
    for (service, config) in configs {
        state.chaos.set(&service, config);
    }
    Json(json!({ "ok": true }))
}

async fn get_mocks(State(state): State<ServerState>) -> Json<HashMap<String, MockConfig>> {
    Json(state.mocks.all())
}

async fn set_mock(
    State(state): State<ServerState>,
    Json(config): Json<MockConfig>,
) -> Json<Value> {
    state.mocks.set(config);
    Json(json!({ "ok": true }))
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
