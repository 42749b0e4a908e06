//! The webhook reconciler: turns signed Stripe deliveries into ledger rows.
//!
//! This is the trust boundary - the caller is Stripe, not an application
//! user, so the only authenticity check is the HMAC signature over the raw
//! body. Delivery is at-least-once; the UNIQUE constraint on the checkout
//! session id makes a redelivered (or concurrently delivered) event a
//! successful no-op. Storage failures return 500 so Stripe redelivers.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::models::RecordContribution;
use crate::payments::{StripeCheckoutSession, StripeWebhookEvent};

/// Status + reason for non-success acknowledgments.
pub type WebhookResult = (StatusCode, &'static str);

#[derive(Serialize)]
struct WebhookAck {
    received: bool,
}

fn extract_signature(headers: &HeaderMap) -> Result<String, WebhookResult> {
    headers
        .get("stripe-signature")
        .ok_or((StatusCode::BAD_REQUEST, "Missing stripe-signature header"))?
        .to_str()
        .map(|s| s.to_string())
        .map_err(|e| {
            tracing::debug!("Invalid UTF-8 in Stripe signature header: {}", e);
            (StatusCode::BAD_REQUEST, "Invalid signature header")
        })
}

/// Run the verify -> filter -> extract -> commit pipeline for one delivery.
/// Returns the reason logged alongside a 200 acknowledgment.
fn process_event(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<&'static str, WebhookResult> {
    // Step 1: verify the signature before trusting a single payload byte.
    let signature = extract_signature(headers)?;
    match state.webhook_verifier.verify(body, &signature) {
        Ok(true) => {}
        Ok(false) => return Err((StatusCode::BAD_REQUEST, "Invalid signature")),
        Err(e) => {
            tracing::debug!("Malformed webhook signature header: {}", e);
            return Err((StatusCode::BAD_REQUEST, "Invalid signature"));
        }
    }

    let event: StripeWebhookEvent = serde_json::from_slice(body).map_err(|e| {
        tracing::error!("Failed to parse Stripe webhook: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid JSON")
    })?;

    // Step 2: only settled checkouts write ledger state. Every other event
    // kind in Stripe's catalog - including ones added after this code was
    // written - is acknowledged untouched.
    if event.event_type != "checkout.session.completed" {
        return Ok("Event ignored");
    }

    let session: StripeCheckoutSession =
        serde_json::from_value(event.data.object).map_err(|e| {
            tracing::error!("Failed to parse checkout session: {}", e);
            (StatusCode::BAD_REQUEST, "Invalid checkout session")
        })?;

    if session.payment_status != "paid" {
        return Ok("Checkout not paid");
    }

    // Step 3: pull back the correlation metadata planted at initiation.
    // Sessions without it were not created by the deposit flow.
    let (Some(group_id), Some(user_id)) =
        (session.metadata.group_id, session.metadata.user_id)
    else {
        tracing::warn!(
            "Checkout session {} has no group/user metadata, skipping",
            session.id
        );
        return Ok("No contribution metadata");
    };

    let Some(amount_cents) = session.amount_total else {
        tracing::warn!("Checkout session {} has no amount_total, skipping", session.id);
        return Ok("No amount");
    };

    // Step 4: commit exactly once per session id.
    let conn = state.db.get().map_err(|e| {
        tracing::error!("DB connection error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
    })?;

    let record = RecordContribution {
        checkout_session_id: session.id.clone(),
        group_id,
        user_id,
        amount_cents,
    };

    match queries::try_record_contribution(&conn, &record) {
        Ok(true) => {
            tracing::info!(
                "Stripe checkout completed: session={}, group={}, user={}, amount_cents={}",
                record.checkout_session_id,
                record.group_id,
                record.user_id,
                record.amount_cents
            );
            Ok("OK")
        }
        Ok(false) => {
            tracing::debug!(
                "Duplicate delivery for session {}, already recorded",
                record.checkout_session_id
            );
            Ok("Already processed")
        }
        Err(e) => {
            tracing::error!("Failed to record contribution: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))
        }
    }
}

/// Axum handler for Stripe webhooks.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process_event(&state, &headers, &body) {
        Ok(note) => {
            tracing::debug!("Webhook acknowledged: {}", note);
            (StatusCode::OK, Json(WebhookAck { received: true })).into_response()
        }
        Err((status, reason)) => (status, reason).into_response(),
    }
}
