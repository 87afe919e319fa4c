// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity adapter: `X-Amz-Target:
//! AWSCognitoIdentityProviderService.*` over JSON.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};

use super::{engine_error, json_response, wire_error};
use crate::state::ServerState;

const SERVICE: &str = "cognito-idp";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService.";

pub fn router(state: ServerState) -> Router {
    Router::new().route("/", post(dispatch)).with_state(state)
}

async fn dispatch(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(operation) = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .and_then(|t| t.strip_prefix(TARGET_PREFIX))
    else {
        return wire_error(SERVICE, "ValidationException", "missing X-Amz-Target");
    };
    let body: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
    let identity = &state.engines.identity;

    match operation {
        "SignUp" => {
            let username = body["Username"].as_str().unwrap_or_default();
            let password = body["Password"].as_str().unwrap_or_default();
            let attributes: HashMap<String, String> = body["UserAttributes"]
                .as_array()
                .map(|attrs| {
                    attrs
                        .iter()
                        .filter_map(|attr| {
                            Some((
                                attr["Name"].as_str()?.to_string(),
                                attr["Value"].as_str()?.to_string(),
                            ))
                        })
                        .collect()
                })
                .unwrap_or_default();
            match identity.sign_up(username, password, attributes) {
                Ok(sub) => json_response(
                    200,
                    json!({ "UserSub": sub, "UserConfirmed": false }),
                ),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "ConfirmSignUp" => {
            let username = body["Username"].as_str().unwrap_or_default();
            match identity.confirm_sign_up(username) {
                Ok(()) => json_response(200, json!({})),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "InitiateAuth" => {
            if body["AuthFlow"].as_str() != Some("USER_PASSWORD_AUTH") {
                return wire_error(
                    SERVICE,
                    "InvalidParameterException",
                    "only USER_PASSWORD_AUTH is supported",
                );
            }
            let username = body["AuthParameters"]["USERNAME"].as_str().unwrap_or_default();
            let password = body["AuthParameters"]["PASSWORD"].as_str().unwrap_or_default();
            match identity.initiate_auth(username, password) {
                Ok(tokens) => json_response(
                    200,
                    json!({
                        "AuthenticationResult": {
                            "IdToken": tokens.id_token,
                            "AccessToken": tokens.access_token,
                            "RefreshToken": tokens.refresh_token,
                            "ExpiresIn": tokens.expires_in,
                            "TokenType": "Bearer",
                        }
                    }),
                ),
                Err(err) => match err {
                    lws_core::EngineError::PermissionDenied(message) => {
                        wire_error(SERVICE, "NotAuthorizedException", &message)
                    }
                    other => engine_error(SERVICE, &other),
                },
            }
        }
        "AdminGetUser" => {
            let username = body["Username"].as_str().unwrap_or_default();
            match identity.get_user(username) {
                Ok(user) => {
                    let attributes: Vec<Value> = user
                        .attributes
                        .iter()
                        .map(|(name, value)| json!({ "Name": name, "Value": value }))
                        .collect();
                    json_response(
                        200,
                        json!({
                            "Username": user.username,
                            "UserStatus": if user.confirmed { "CONFIRMED" } else { "UNCONFIRMED" },
                            "UserAttributes": attributes,
                        }),
                    )
                }
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        "ListUsers" => {
            let users: Vec<Value> = identity
                .list_users()
                .iter()
                .map(|user| {
                    json!({
                        "Username": user.username,
                        "UserStatus": if user.confirmed { "CONFIRMED" } else { "UNCONFIRMED" },
                    })
                })
                .collect();
            json_response(200, json!({ "Users": users }))
        }
        other => wire_error(SERVICE, "ValidationException", &format!("unknown operation {other}")),
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
