// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity authorization.
//!
//! Resolves the caller from the configured identity header, maps the
//! operation to its required action, and runs the deny-overrides
//! policy engine. Enforce mode answers denials in the service's native
//! error format; audit mode logs them and lets the request through.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use lws_engine::identity::Decision;
use lws_wire::{format_error, ErrorFormat};

use super::extract::ExtractedOperation;
use crate::state::ServerState;

pub async fn layer(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    if super::is_management(request.uri().path()) {
        return next.run(request).await;
    }
    let mode = effective_mode(&state);
    if mode == "disabled" {
        return next.run(request).await;
    }
    let operation = request
        .extensions()
        .get::<ExtractedOperation>()
        .and_then(|op| op.0.clone());
    let Some(operation) = operation else {
        return next.run(request).await;
    };

    let identity_spec = &state.config.identity;
    let identity = request
        .headers()
        .get(identity_spec.identity_header.to_ascii_lowercase())
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(&identity_spec.default_identity)
        .to_string();

    let action = format!("{}:{}", state.service, kebab_to_pascal(&operation));
    let (decision, reason) =
        state.engines.identity.authorize(&identity, state.service, &[action.clone()]);

    if decision == Decision::Allow {
        return next.run(request).await;
    }
    if mode == "audit" {
        tracing::warn!(
            service = %state.service,
            operation = %operation,
            identity = %identity,
            reason = %reason,
            "identity audit: DENY"
        );
        return next.run(request).await;
    }

    tracing::warn!(
        service = %state.service,
        operation = %operation,
        identity = %identity,
        reason = %reason,
        "identity enforce: DENY"
    );
    deny_response(state.service, &identity, &action, &reason)
}

fn effective_mode(state: &ServerState) -> String {
    state
        .config
        .identity
        .services
        .get(state.service)
        .cloned()
        .unwrap_or_else(|| state.config.identity.mode.clone())
}

fn deny_response(service: &str, identity: &str, action: &str, reason: &str) -> Response {
    let format = ErrorFormat::for_service(service);
    let code = match format {
        ErrorFormat::Json => "AccessDeniedException",
        ErrorFormat::XmlObjectStore | ErrorFormat::XmlIdentity => "AccessDenied",
    };
    let message = format!("User {identity} is not authorized to perform {action}: {reason}");
    let wire = format_error(code, &message, format);
    Response::builder()
        .status(StatusCode::from_u16(wire.status).unwrap_or(StatusCode::FORBIDDEN))
        .header("content-type", wire.content_type)
        .body(Body::from(wire.body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// `get-item` → `GetItem`.
pub fn kebab_to_pascal(operation: &str) -> String {
    operation
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
