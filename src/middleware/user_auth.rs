use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::AppState;
use crate::error::{AppError, Result};

/// The authenticated caller, resolved from the bearer token by the identity
/// provider and attached to request extensions.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: Option<String>,
}

/// Require a valid bearer token on the request.
///
/// Missing or unresolvable tokens are 401. The identity provider is the only
/// authority consulted - no token state is held locally.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let user = state
        .identity
        .resolve_token(token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthedUser {
        id: user.id,
        email: user.email,
    });

    Ok(next.run(request).await)
}
