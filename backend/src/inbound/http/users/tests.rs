//! Tests for account HTTP handlers.

use super::*;
use crate::domain::ErrorCode;
use crate::inbound::http::test_utils::{TestBackend, signed_up};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

#[derive(Debug)]
struct ValidationExpectation<'a> {
    field: &'a str,
    code: &'a str,
}

#[rstest]
#[case(
    json!({"password": "secret", "name": "Cook"}),
    ValidationExpectation { field: "email", code: "missing_field" }
)]
#[case(
    json!({"email": "not-an-email", "password": "secret", "name": "Cook"}),
    ValidationExpectation { field: "email", code: "invalid_value" }
)]
#[case(
    json!({"email": "cook@example.com", "password": "pw", "name": "Cook"}),
    ValidationExpectation { field: "password", code: "invalid_value" }
)]
#[case(
    json!({"email": "cook@example.com", "password": "secret", "name": "  "}),
    ValidationExpectation { field: "name", code: "invalid_value" }
)]
fn registration_payloads_are_validated(
    #[case] body: Value,
    #[case] expected: ValidationExpectation<'_>,
) {
    let payload: CreateUserRequest = serde_json::from_value(body).expect("payload");
    let err = parse_registration(payload).expect_err("invalid registration");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details(),
        Some(&json!({"field": expected.field, "code": expected.code}))
    );
}

#[rstest]
#[case(true, Err("missing_field"))]
#[case(false, Ok(()))]
fn put_requires_a_name_but_patch_does_not(
    #[case] require_name: bool,
    #[case] expected: Result<(), &str>,
) {
    let payload = ProfileUpdateRequest {
        name: None,
        password: Some("longer-secret".to_owned()),
    };
    match (parse_profile_changes(payload, require_name), expected) {
        (Ok(changes), Ok(())) => {
            assert!(changes.name.is_none());
            assert!(changes.password.is_some());
        }
        (Err(err), Err(code)) => {
            assert_eq!(err.details(), Some(&json!({"field": "name", "code": code})));
        }
        (other, want) => panic!("unexpected {other:?} for {want:?}"),
    }
}

#[actix_web::test]
async fn registration_returns_profile_without_password() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/user/create")
            .set_json(json!({
                "email": "Cook@EXAMPLE.com",
                "password": "secret",
                "name": "Cook"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body, json!({"email": "Cook@example.com", "name": "Cook"}));
}

#[actix_web::test]
async fn duplicate_registration_is_rejected() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    signed_up(&app, "cook@example.com").await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/user/create")
            .set_json(json!({
                "email": "cook@example.com",
                "password": "another",
                "name": "Copycat"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["code"], "duplicate_email");
}

#[rstest]
#[case::wrong_password("cook@example.com", "wrong-pass")]
#[case::unknown_email("nobody@example.com", "testpass123")]
#[actix_web::test]
async fn bad_credentials_issue_no_token(#[case] email: &str, #[case] password: &str) {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    signed_up(&app, "cook@example.com").await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/user/token")
            .set_json(json!({"email": email, "password": password}))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert!(body.get("token").is_none());
}

#[actix_web::test]
async fn token_is_stable_across_requests() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    let first = signed_up(&app, "cook@example.com").await;

    let again: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/user/token")
            .set_json(json!({"email": "cook@example.com", "password": "testpass123"}))
            .to_request(),
    )
    .await;
    assert_eq!(again["token"].as_str().map(|t| format!("Token {t}")), Some(first));
}

#[rstest]
#[case::missing(None)]
#[case::unknown(Some("Token 0000000000000000000000000000000000000000"))]
#[case::wrong_scheme(Some("Basic Y29vazpzZWNyZXQ="))]
#[actix_web::test]
async fn profile_requires_a_valid_token(#[case] header: Option<&str>) {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;

    let mut request = actix_test::TestRequest::get().uri("/api/user/me");
    if let Some(value) = header {
        request = request.insert_header(("Authorization", value));
    }
    let response = actix_test::call_service(&app, request.to_request()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "unauthorized");
}

#[actix_web::test]
async fn profile_updates_apply_name_and_password() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    let token = signed_up(&app, "cook@example.com").await;

    let profile: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/user/me")
            .insert_header(("Authorization", token.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(profile, json!({"email": "cook@example.com", "name": "Test Cook"}));

    let patched: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::patch()
            .uri("/api/user/me")
            .insert_header(("Authorization", token.as_str()))
            .set_json(json!({"name": "Head Cook", "password": "brand-new-pass"}))
            .to_request(),
    )
    .await;
    assert_eq!(patched["name"], "Head Cook");

    let old_password = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/user/token")
            .set_json(json!({"email": "cook@example.com", "password": "testpass123"}))
            .to_request(),
    )
    .await;
    assert_eq!(old_password.status(), StatusCode::BAD_REQUEST);

    let new_password = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/user/token")
            .set_json(json!({"email": "cook@example.com", "password": "brand-new-pass"}))
            .to_request(),
    )
    .await;
    assert_eq!(new_password.status(), StatusCode::OK);

    let replaced = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/api/user/me")
            .insert_header(("Authorization", token.as_str()))
            .set_json(json!({"password": "another-pass"}))
            .to_request(),
    )
    .await;
    assert_eq!(replaced.status(), StatusCode::BAD_REQUEST);
}
