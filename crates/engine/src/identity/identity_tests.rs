// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lws_core::FakeClock;
use serde_json::json;

fn engine() -> IdentityEngine<FakeClock> {
    // Token validation compares `exp` against real wall-clock time, so
    // the fake clock must issue from the present.
    let clock = FakeClock::new();
    clock.set_epoch_ms(lws_core::SystemClock.epoch_ms());
    let spec = IdentitySpec {
        identities: vec![
            IdentityUserSpec {
                name: "admin-user".to_string(),
                policies: vec![json!({"Statement": [{"Effect": "Allow", "Action": "*", "Resource": "*"}]})],
                boundary: None,
            },
            IdentityUserSpec {
                name: "reader".to_string(),
                policies: vec![json!({"Statement": [{"Effect": "Allow", "Action": "dynamodb:GetItem", "Resource": "*"}]})],
                boundary: None,
            },
        ],
        ..IdentitySpec::default()
    };
    IdentityEngine::from_config(&spec, clock)
}

#[test]
fn sign_up_confirm_auth_flow() {
    let engine = engine();
    let sub = engine
        .sign_up("ada", "pw-1", [("email".to_string(), "ada@example.com".to_string())].into())
        .unwrap();

    // Unconfirmed users cannot authenticate.
    assert!(matches!(
        engine.initiate_auth("ada", "pw-1").unwrap_err(),
        EngineError::PermissionDenied(_)
    ));

    engine.confirm_sign_up("ada").unwrap();
    let tokens = engine.initiate_auth("ada", "pw-1").unwrap();
    assert_eq!(tokens.expires_in, 3600);

    let claims = engine.issuer().decode(&tokens.id_token, "id").unwrap();
    assert_eq!(claims.sub, sub);
    assert_eq!(claims.username, "ada");
    assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
    assert_eq!(claims.token_use, "id");

    let access = engine.issuer().decode(&tokens.access_token, "access").unwrap();
    assert_eq!(access.token_use, "access");
    assert_eq!(access.scope.as_deref(), Some("aws.cognito.signin.user.admin"));
}

#[test]
fn wrong_password_is_denied() {
    let engine = engine();
    engine.sign_up("ada", "pw-1", HashMap::new()).unwrap();
    engine.confirm_sign_up("ada").unwrap();
    assert!(matches!(
        engine.initiate_auth("ada", "wrong").unwrap_err(),
        EngineError::PermissionDenied(_)
    ));
}

#[test]
fn duplicate_username_rejected() {
    let engine = engine();
    engine.sign_up("ada", "pw", HashMap::new()).unwrap();
    assert!(matches!(
        engine.sign_up("ada", "pw", HashMap::new()).unwrap_err(),
        EngineError::AlreadyExists { .. }
    ));
}

#[test]
fn id_token_fails_access_validation() {
    let engine = engine();
    engine.sign_up("ada", "pw", HashMap::new()).unwrap();
    engine.confirm_sign_up("ada").unwrap();
    let tokens = engine.initiate_auth("ada", "pw").unwrap();
    assert!(engine.issuer().decode(&tokens.id_token, "access").is_err());
    assert!(engine.issuer().decode("garbage", "id").is_err());
}

#[test]
fn authorize_consults_the_identity_catalog() {
    let engine = engine();
    let (decision, _) = engine.authorize(
        "admin-user",
        "dynamodb",
        &["dynamodb:PutItem".to_string()],
    );
    assert_eq!(decision, Decision::Allow);

    let (decision, _) =
        engine.authorize("reader", "dynamodb", &["dynamodb:GetItem".to_string()]);
    assert_eq!(decision, Decision::Allow);

    let (decision, reason) =
        engine.authorize("reader", "dynamodb", &["dynamodb:PutItem".to_string()]);
    assert_eq!(decision, Decision::Deny);
    assert!(reason.contains("dynamodb:PutItem"));

    let (decision, reason) =
        engine.authorize("ghost", "dynamodb", &["dynamodb:GetItem".to_string()]);
    assert_eq!(decision, Decision::Deny);
    assert!(reason.contains("unknown identity"));
    assert!(engine.known_identity("reader"));
    assert!(!engine.known_identity("ghost"));
}
