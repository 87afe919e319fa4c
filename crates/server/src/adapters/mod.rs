// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol adapters: one router per service, translating its wire
//! dialect into engine calls.

pub mod bus;
pub mod identity;
pub mod object;
pub mod params;
pub mod queue;
pub mod secrets;
pub mod sfn;
pub mod sts;
pub mod table;
pub mod topic;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use lws_core::EngineError;
use lws_wire::{format_engine_error, format_error, ErrorFormat, AMZ_JSON_10};
use uuid::Uuid;

pub(crate) fn request_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn json_response(status: u16, value: serde_json::Value) -> Response {
    build(status, AMZ_JSON_10, value.to_string())
}

pub(crate) fn xml_response(body: String) -> Response {
    build(200, "text/xml", body)
}

/// Translate an engine error into the service's native error format.
pub(crate) fn engine_error(service: &str, err: &EngineError) -> Response {
    let wire = format_engine_error(service, err, ErrorFormat::for_service(service));
    build(wire.status, wire.content_type, wire.body)
}

/// A plain wire error by code, for adapter-level validation.
pub(crate) fn wire_error(service: &str, code: &str, message: &str) -> Response {
    let wire = format_error(code, message, ErrorFormat::for_service(service));
    build(wire.status, wire.content_type, wire.body)
}

fn build(status: u16, content_type: &str, body: String) -> Response {
    Response::builder()
        .status(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Last path segment of a queue or topic URL/arn, which is how the
/// form dialect names resources.
pub(crate) fn name_from_url(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}
