//! Signup and login pass-throughs to the hosted identity provider.
//!
//! Passwords are forwarded, never stored. Signup additionally bootstraps the
//! local profile row that the social features hang off.

use axum::{extract::State, routing::post, Router};
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;
use crate::db::{queries, AppState};
use crate::error::{msg, OptionExt, Result};
use crate::extractors::Json;
use crate::identity::UserIdentity;
use crate::models::{CreateProfile, Profile};
use crate::rate_limit;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// Defaults to the email local part when omitted
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: UserIdentity,
    pub profile: Profile,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SignupResponse>> {
    let user = state
        .identity
        .sign_up(&request.email, &request.password)
        .await?;

    let username = request
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| {
            request
                .email
                .split('@')
                .next()
                .unwrap_or(&request.email)
                .to_string()
        });

    let conn = state.db.get()?;
    let profile = queries::create_profile(
        &conn,
        &CreateProfile {
            user_id: user.id.clone(),
            username,
        },
    )?;

    tracing::info!("New signup: {} ({})", profile.username, user.id);

    Ok(Json(SignupResponse {
        message: "User signed up and profile created",
        user,
        profile,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserIdentity,
    pub profile: Profile,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let session = state
        .identity
        .sign_in(&request.email, &request.password)
        .await?;

    let conn = state.db.get()?;
    let profile = queries::get_profile_by_id(&conn, &session.user.id)?
        .or_not_found(msg::PROFILE_NOT_FOUND)?;

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        user: session.user,
        profile,
    }))
}

pub fn router(limits: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route(
            "/signup",
            post(signup).layer(rate_limit::standard_layer(limits.standard_rpm)),
        )
        .route(
            "/login",
            post(login).layer(rate_limit::standard_layer(limits.standard_rpm)),
        )
}
