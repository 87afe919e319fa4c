// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lws-wire: wire-dialect plumbing shared by the protocol adapters.
//!
//! Three dialects cross this crate: JSON bodies selected by an
//! `X-Amz-Target` header, form-encoded `Action` requests answered in
//! XML, and REST-over-path for the object store. The crate knows how
//! to extract a normalized operation name from each, how to decode
//! the form dialect's numbered-entry convention, and how to render
//! every response and error envelope. It knows nothing about any HTTP
//! framework.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod form;
mod json;
mod operation;
mod status;
mod xml;

pub use form::{decode_form, nested_params, numbered_entries, FormParams};
pub use json::{json_error_body, AMZ_JSON_10, AMZ_JSON_11};
pub use operation::{
    camel_to_kebab, object_store_operation, operation_from_action, operation_from_target,
    target_prefix, ObjectRequest,
};
pub use status::{status_for, wire_code, ErrorFormat};
pub use xml::{action_response, identity_error, object_store_error, parse_tagging, Xml};

/// A fully rendered wire error: status, content type, body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

/// Render an error in the given format, resolving the HTTP status from
/// the central table.
pub fn format_error(code: &str, message: &str, format: ErrorFormat) -> WireError {
    let status = status_for(code);
    match format {
        ErrorFormat::Json => WireError {
            status,
            content_type: AMZ_JSON_10,
            body: json_error_body(code, message),
        },
        ErrorFormat::XmlObjectStore => WireError {
            status,
            content_type: "application/xml",
            body: xml::object_store_error(code, message),
        },
        ErrorFormat::XmlIdentity => WireError {
            status,
            content_type: "text/xml",
            body: xml::identity_error(code, message),
        },
    }
}

/// Render an engine error for a service, picking the service-native
/// code name first.
pub fn format_engine_error(
    service: &str,
    err: &lws_core::EngineError,
    format: ErrorFormat,
) -> WireError {
    let code = wire_code(service, err);
    format_error(code, &err.to_string(), format)
}
