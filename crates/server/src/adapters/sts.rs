// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity-token adapter: form-encoded `Action` answered in the
//! identity XML dialect.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use lws_core::arn;
use lws_wire::{decode_form, Xml};

use super::{request_id, wire_error, xml_response};
use crate::state::ServerState;

const SERVICE: &str = "sts";

pub fn router(state: ServerState) -> Router {
    Router::new().route("/", post(dispatch)).with_state(state)
}

async fn dispatch(State(state): State<ServerState>, body: Bytes) -> Response {
    let params = decode_form(&String::from_utf8_lossy(&body));
    match params.get("Action") {
        Some("GetCallerIdentity") => {
            let identity = &state.config.identity.default_identity;
            let doc = Xml::new("GetCallerIdentityResponse")
                .child(
                    Xml::new("GetCallerIdentityResult")
                        .child(Xml::text("Account", arn::ACCOUNT))
                        .child(Xml::text(
                            "Arn",
                            format!("arn:aws:iam::{}:user/{identity}", arn::ACCOUNT),
                        ))
                        .child(Xml::text("UserId", identity.to_ascii_uppercase())),
                )
                .child(
                    Xml::new("ResponseMetadata").child(Xml::text("RequestId", request_id())),
                )
                .render();
            xml_response(doc)
        }
        Some(other) => {
            wire_error(SERVICE, "InvalidAction", &format!("unknown action {other}"))
        }
        None => wire_error(SERVICE, "MissingAction", "no Action parameter"),
    }
}

#[cfg(test)]
#[path = "sts_tests.rs"]
mod tests;
