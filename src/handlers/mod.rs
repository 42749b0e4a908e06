pub mod auth;
pub mod deposits;
pub mod friends;
pub mod groups;
pub mod webhooks;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::rate_limit;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Assemble the full application router.
pub fn app_router(state: AppState, limits: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route(
            "/health",
            get(health).layer(rate_limit::relaxed_layer(limits.relaxed_rpm)),
        )
        .merge(auth::router(limits))
        .merge(friends::router(state.clone()))
        .merge(groups::router(state.clone()))
        .merge(deposits::router(state, limits))
        .merge(webhooks::router())
}
