//! Test utilities and fixtures for Chipin integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use chipin::db::{init_db, queries, AppState};
use chipin::error::{AppError, Result};
use chipin::handlers;
use chipin::identity::{AuthSession, IdentityProvider, UserIdentity};
use chipin::middleware::require_user;
pub use chipin::models::*;
use chipin::payments::{CheckoutProvider, CheckoutSession, CheckoutSpec, WebhookVerifier};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test123secret456";

/// Bearer token the fake identity provider resolves back to `user_id`.
pub fn token_for(user_id: &str) -> String {
    format!("tok-{}", user_id)
}

/// Identity fake: any `tok-<id>` bearer token resolves to user `<id>`,
/// signup derives a deterministic id from the email, and the password
/// "wrong" fails login.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity> {
        if password.len() < 6 {
            return Err(AppError::BadRequest("Password too short".into()));
        }
        Ok(UserIdentity {
            id: format!("uid-{}", email),
            email: Some(email.to_string()),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        if password == "wrong" {
            return Err(AppError::Unauthorized);
        }
        let user = UserIdentity {
            id: format!("uid-{}", email),
            email: Some(email.to_string()),
        };
        Ok(AuthSession {
            access_token: token_for(&user.id),
            user,
        })
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<UserIdentity>> {
        Ok(token.strip_prefix("tok-").map(|id| UserIdentity {
            id: id.to_string(),
            email: None,
        }))
    }
}

/// Checkout fake that records every spec it is asked to create a session
/// for. Session ids are sequential (`cs_test_1`, `cs_test_2`, ...).
#[derive(Default)]
pub struct FakeCheckout {
    pub calls: Mutex<Vec<CheckoutSpec>>,
    pub fail: bool,
}

impl FakeCheckout {
    /// A fake that errors on every call, simulating a processor outage.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<CheckoutSpec> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CheckoutProvider for FakeCheckout {
    async fn create_checkout_session(&self, spec: &CheckoutSpec) -> Result<CheckoutSession> {
        if self.fail {
            return Err(AppError::Payment("simulated processor outage".into()));
        }
        let mut calls = self.calls.lock().unwrap();
        calls.push(spec.clone());
        let n = calls.len();
        Ok(CheckoutSession {
            id: format!("cs_test_{}", n),
            url: format!("https://checkout.stripe.test/c/pay/cs_test_{}", n),
        })
    }
}

/// Create an in-memory test database with schema initialized.
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState for testing with an in-memory database and the fake
/// providers. The pool is capped at one connection so every handler sees
/// the same in-memory database.
pub fn test_state_with(checkout: Arc<dyn CheckoutProvider>) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        identity: Arc::new(FakeIdentity),
        checkout,
        webhook_verifier: WebhookVerifier::new(TEST_WEBHOOK_SECRET),
        base_url: "http://localhost:3001".to_string(),
        success_page_url: "http://localhost:3000/success?session_id={CHECKOUT_SESSION_ID}"
            .to_string(),
        cancel_page_url: "http://localhost:3000/cancel".to_string(),
    }
}

pub fn test_state() -> (AppState, Arc<FakeCheckout>) {
    let checkout = Arc::new(FakeCheckout::default());
    (test_state_with(checkout.clone()), checkout)
}

/// Create a Router with all endpoints (without rate limiting for tests).
pub fn test_app(state: AppState) -> Router {
    let deposit_routes = Router::new()
        .route(
            "/groups/{group_id}/deposit",
            post(handlers::deposits::initiate_deposit),
        )
        .route("/groups/{group_id}/total", get(handlers::deposits::group_total))
        .route(
            "/groups/{group_id}/contributions",
            get(handlers::deposits::group_contributions),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ));

    Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .merge(handlers::friends::router(state.clone()))
        .merge(handlers::groups::router(state.clone()))
        .merge(deposit_routes)
        .merge(handlers::webhooks::router())
        .with_state(state)
}

// ============ Fixtures ============

pub fn seed_profile(state: &AppState, user_id: &str, username: &str) -> Profile {
    let conn = state.db.get().unwrap();
    queries::create_profile(
        &conn,
        &CreateProfile {
            user_id: user_id.to_string(),
            username: username.to_string(),
        },
    )
    .expect("Failed to create test profile")
}

pub fn seed_group(state: &AppState, creator_id: &str, name: &str) -> Group {
    let mut conn = state.db.get().unwrap();
    queries::create_group_with_creator(
        &mut conn,
        &CreateGroup {
            name: name.to_string(),
            creator_id: creator_id.to_string(),
        },
    )
    .expect("Failed to create test group")
}

pub fn seed_contribution(
    state: &AppState,
    session_id: &str,
    group_id: &str,
    user_id: &str,
    amount_cents: i64,
) {
    let conn = state.db.get().unwrap();
    let recorded = queries::try_record_contribution(
        &conn,
        &RecordContribution {
            checkout_session_id: session_id.to_string(),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            amount_cents,
        },
    )
    .expect("Failed to record test contribution");
    assert!(recorded, "fixture contribution was a duplicate");
}

pub fn ledger_rows(state: &AppState, group_id: &str) -> Vec<LedgerEntry> {
    let conn = state.db.get().unwrap();
    queries::list_group_payments(&conn, group_id).expect("Failed to list ledger rows")
}

// ============ Request helpers ============

/// Build a JSON request, optionally authenticated with a bearer token.
pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body was not JSON")
}

// ============ Webhook helpers ============

/// Get current Unix timestamp as a string (for webhook signature tests)
pub fn current_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Get an old timestamp (for testing timestamp rejection)
pub fn old_timestamp() -> String {
    // 10 minutes ago - beyond the 5-minute tolerance
    (chrono::Utc::now().timestamp() - 600).to_string()
}

pub fn compute_stripe_signature(payload: &[u8], secret: &str, timestamp: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signed_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Signature header for `payload` under the test webhook secret.
pub fn signature_header(payload: &[u8]) -> String {
    let timestamp = current_timestamp();
    let signature = compute_stripe_signature(payload, TEST_WEBHOOK_SECRET, &timestamp);
    format!("t={},v1={}", timestamp, signature)
}

/// A `checkout.session.completed` event payload as Stripe delivers it.
pub fn checkout_completed_event(
    session_id: &str,
    group_id: &str,
    user_id: &str,
    amount_total: i64,
) -> serde_json::Value {
    serde_json::json!({
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_status": "paid",
                "amount_total": amount_total,
                "currency": "usd",
                "metadata": {
                    "user_id": user_id,
                    "group_id": group_id
                }
            }
        }
    })
}

/// Build a webhook delivery request with an explicit signature header.
pub fn webhook_request(body: Vec<u8>, signature: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/stripe/webhook")
        .header("stripe-signature", signature)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Deliver `event` with a valid signature and return the response.
pub async fn deliver_event(
    app: &Router,
    event: &serde_json::Value,
) -> Response<Body> {
    use tower::ServiceExt;

    let body = event.to_string().into_bytes();
    let signature = signature_header(&body);
    app.clone()
        .oneshot(webhook_request(body, &signature))
        .await
        .unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "unexpected status (expected {})",
        expected
    );
}
