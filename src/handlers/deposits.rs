//! The deposit flow: checkout initiation and ledger reads.
//!
//! Initiation writes no local state - the only link to the eventual webhook
//! settlement is the metadata embedded in the checkout session. Totals and
//! contributions are pure aggregations over rows the reconciler committed.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::middleware::{require_user, AuthedUser};
use crate::models::{cents_to_amount, UserContribution};
use crate::payments::CheckoutSpec;
use crate::rate_limit;

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    /// Amount in dollars; converted to cents before reaching the processor
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub url: String,
}

pub async fn initiate_deposit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(group_id): Path<String>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<DepositResponse>> {
    // Validation happens before any remote call.
    let amount = match request.amount {
        Some(a) if a.is_finite() && a > 0.0 => a,
        _ => return Err(AppError::BadRequest(msg::INVALID_AMOUNT.into())),
    };

    // A checkout against a nonexistent group could never reconcile; reject
    // it before money changes hands.
    let conn = state.db.get()?;
    queries::get_group_by_id(&conn, &group_id)?.or_not_found(msg::GROUP_NOT_FOUND)?;
    drop(conn);

    // Round half away from zero at the cents boundary.
    let amount_cents = (amount * 100.0).round() as i64;

    let session = state
        .checkout
        .create_checkout_session(&CheckoutSpec {
            amount_cents,
            currency: "usd".to_string(),
            user_id: user.id.clone(),
            group_id: group_id.clone(),
            success_url: state.success_page_url.clone(),
            cancel_url: state.cancel_page_url.clone(),
        })
        .await?;

    tracing::info!(
        "Checkout session created: session={}, group={}, user={}, amount_cents={}",
        session.id,
        group_id,
        user.id,
        amount_cents
    );

    Ok(Json(DepositResponse { url: session.url }))
}

#[derive(Debug, Serialize)]
pub struct GroupTotalResponse {
    pub group_id: String,
    pub total_deposited: f64,
}

pub async fn group_total(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupTotalResponse>> {
    let conn = state.db.get()?;
    let cents = queries::group_total_cents(&conn, &group_id)?;

    Ok(Json(GroupTotalResponse {
        group_id,
        total_deposited: cents_to_amount(cents),
    }))
}

#[derive(Debug, Serialize)]
pub struct ContributionsResponse {
    pub contributions: BTreeMap<String, UserContribution>,
}

pub async fn group_contributions(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<ContributionsResponse>> {
    let conn = state.db.get()?;
    let rows = queries::group_contributions(&conn, &group_id)?;

    let contributions = rows
        .into_iter()
        .map(|row| {
            (
                row.user_id,
                UserContribution {
                    username: row.username,
                    total: cents_to_amount(row.total_cents),
                },
            )
        })
        .collect();

    Ok(Json(ContributionsResponse { contributions }))
}

pub fn router(state: AppState, limits: RateLimitConfig) -> Router<AppState> {
    Router::new()
        // Strict tier: this endpoint calls out to the payment processor.
        .route(
            "/groups/{group_id}/deposit",
            post(initiate_deposit).layer(rate_limit::strict_layer(limits.strict_rpm)),
        )
        .route("/groups/{group_id}/total", get(group_total))
        .route("/groups/{group_id}/contributions", get(group_contributions))
        .route_layer(axum::middleware::from_fn_with_state(state, require_user))
}
