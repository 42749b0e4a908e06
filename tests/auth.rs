//! Signup/login pass-throughs and bearer-token middleware behavior.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn signup_bootstraps_a_profile() {
    let (state, _) = test_state();
    let app = test_app(state.clone());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/signup",
            None,
            Some(json!({"email": "alice@example.com", "password": "hunter22", "username": "alice"})),
        ))
        .await
        .unwrap();

    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["profile"]["username"], "alice");
    assert_eq!(body["user"]["id"], "uid-alice@example.com");

    let conn = state.db.get().unwrap();
    let profile = queries::get_profile_by_id(&conn, "uid-alice@example.com")
        .unwrap()
        .expect("profile row should exist");
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.session_hours, 0);
}

#[tokio::test]
async fn signup_defaults_username_to_email_local_part() {
    let (state, _) = test_state();
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/signup",
            None,
            Some(json!({"email": "carol@example.com", "password": "hunter22"})),
        ))
        .await
        .unwrap();

    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["profile"]["username"], "carol");
}

#[tokio::test]
async fn signup_with_taken_username_conflicts() {
    let (state, _) = test_state();
    seed_profile(&state, "existing", "alice");
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/signup",
            None,
            Some(json!({"email": "alice2@example.com", "password": "hunter22", "username": "alice"})),
        ))
        .await
        .unwrap();

    assert_status(&response, StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_provider_rejection_propagates() {
    let (state, _) = test_state();
    let app = test_app(state.clone());

    // The fake provider rejects short passwords, standing in for any
    // provider-side validation failure.
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/signup",
            None,
            Some(json!({"email": "dave@example.com", "password": "abc"})),
        ))
        .await
        .unwrap();

    assert_status(&response, StatusCode::BAD_REQUEST);

    // No half-created profile left behind.
    let conn = state.db.get().unwrap();
    assert!(queries::get_profile_by_id(&conn, "uid-dave@example.com")
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn login_returns_token_and_profile() {
    let (state, _) = test_state();
    seed_profile(&state, "uid-alice@example.com", "alice");
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "hunter22"})),
        ))
        .await
        .unwrap();

    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["access_token"], "tok-uid-alice@example.com");
    assert_eq!(body["profile"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn login_with_bad_credentials_is_401() {
    let (state, _) = test_state();
    seed_profile(&state, "uid-alice@example.com", "alice");
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong"})),
        ))
        .await
        .unwrap();

    assert_status(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_without_profile_is_404() {
    let (state, _) = test_state();
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "stranger@example.com", "password": "hunter22"})),
        ))
        .await
        .unwrap();

    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_endpoints_reject_missing_and_bad_tokens() {
    let (state, _) = test_state();
    seed_profile(&state, "u1", "alice");
    let app = test_app(state);

    let missing = app
        .clone()
        .oneshot(json_request(Method::GET, "/friends/list", None, None))
        .await
        .unwrap();
    assert_status(&missing, StatusCode::UNAUTHORIZED);

    let invalid = app
        .oneshot(json_request(
            Method::GET,
            "/friends/list",
            Some("garbage-token"),
            None,
        ))
        .await
        .unwrap();
    assert_status(&invalid, StatusCode::UNAUTHORIZED);
}
