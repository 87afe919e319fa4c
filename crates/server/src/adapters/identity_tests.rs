// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use serde_json::json;

use crate::test_support::{body_json, call, config, target_request, test_state};

fn target(op: &str) -> String {
    format!("AWSCognitoIdentityProviderService.{op}")
}

fn idp_router() -> axum::Router {
    let (state, _) = test_state(config(""));
    super::router(state.for_service("cognito-idp"))
}

#[tokio::test]
async fn sign_up_confirm_and_authenticate() {
    let router = idp_router();
    let signed_up = body_json(
        call(
            router.clone(),
            target_request(
                &target("SignUp"),
                json!({
                    "Username": "ada",
                    "Password": "pw-1",
                    "UserAttributes": [{"Name": "email", "Value": "ada@example.com"}],
                }),
            ),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(signed_up["UserConfirmed"], false);
    assert!(signed_up["UserSub"].is_string());

    call(router.clone(), target_request(&target("ConfirmSignUp"), json!({"Username": "ada"})))
        .await;

    let auth = body_json(
        call(
            router,
            target_request(
                &target("InitiateAuth"),
                json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "AuthParameters": {"USERNAME": "ada", "PASSWORD": "pw-1"},
                }),
            ),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let result = &auth["AuthenticationResult"];
    assert_eq!(result["TokenType"], "Bearer");
    assert_eq!(result["ExpiresIn"], 3600);
    // Three dot-separated segments: a signed JWT.
    assert_eq!(result["IdToken"].as_str().unwrap().matches('.').count(), 2);
}

#[tokio::test]
async fn wrong_password_is_not_authorized() {
    let router = idp_router();
    call(
        router.clone(),
        target_request(&target("SignUp"), json!({"Username": "ada", "Password": "pw"})),
    )
    .await;
    call(router.clone(), target_request(&target("ConfirmSignUp"), json!({"Username": "ada"})))
        .await;
    let error = body_json(
        call(
            router,
            target_request(
                &target("InitiateAuth"),
                json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "AuthParameters": {"USERNAME": "ada", "PASSWORD": "nope"},
                }),
            ),
        )
        .await,
        StatusCode::UNAUTHORIZED,
    )
    .await;
    assert_eq!(error["__type"], "NotAuthorizedException");
}

#[tokio::test]
async fn unsupported_auth_flow_is_rejected() {
    let router = idp_router();
    let error = body_json(
        call(
            router,
            target_request(&target("InitiateAuth"), json!({"AuthFlow": "CUSTOM_AUTH"})),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(error["__type"], "InvalidParameterException");
}

#[tokio::test]
async fn admin_get_user_reports_status_and_attributes() {
    let router = idp_router();
    call(
        router.clone(),
        target_request(
            &target("SignUp"),
            json!({
                "Username": "ada",
                "Password": "pw",
                "UserAttributes": [{"Name": "email", "Value": "a@b.c"}],
            }),
        ),
    )
    .await;
    let user = body_json(
        call(router.clone(), target_request(&target("AdminGetUser"), json!({"Username": "ada"})))
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(user["UserStatus"], "UNCONFIRMED");
    assert_eq!(user["UserAttributes"][0]["Name"], "email");

    let error = body_json(
        call(router, target_request(&target("AdminGetUser"), json!({"Username": "ghost"}))).await,
        StatusCode::NOT_FOUND,
    )
    .await;
    assert_eq!(error["__type"], "UserNotFoundException");
}
