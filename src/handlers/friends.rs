use axum::{
    extract::State,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::middleware::{require_user, AuthedUser};
use crate::models::{FriendProfile, Friendship, FriendshipStatus};

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct FriendRequestResponse {
    pub message: String,
    pub friendship: Friendship,
}

pub async fn request_friend(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(request): Json<FriendRequestBody>,
) -> Result<Json<FriendRequestResponse>> {
    let conn = state.db.get()?;

    let receiver = queries::get_profile_by_username(&conn, &request.username)?
        .or_not_found(msg::USER_NOT_FOUND)?;

    if receiver.id == user.id {
        return Err(AppError::BadRequest("Cannot send a friend request to yourself".into()));
    }

    // Either direction counts: an incoming pending request from the target
    // blocks a new outgoing one just like an accepted friendship does.
    if queries::find_friendship_between(&conn, &user.id, &receiver.id)?.is_some() {
        return Err(AppError::Conflict("Already friends".into()));
    }

    let friendship = queries::create_friend_request(&conn, &user.id, &receiver.id)?;

    Ok(Json(FriendRequestResponse {
        message: format!("Friend request sent to {}", request.username),
        friendship,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FriendRespondBody {
    pub requester_id: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct FriendRespondResponse {
    pub message: String,
    pub friendship: Friendship,
}

pub async fn respond_friend(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(request): Json<FriendRespondBody>,
) -> Result<Json<FriendRespondResponse>> {
    let (status, message) = match request.action.as_str() {
        "accept" => (FriendshipStatus::Accept, "Friend request accepted"),
        "decline" => (FriendshipStatus::Decline, "Friend request declined"),
        _ => return Err(AppError::BadRequest("Invalid action".into())),
    };

    let conn = state.db.get()?;

    let pending = queries::get_pending_request(&conn, &request.requester_id, &user.id)?
        .or_not_found(msg::FRIEND_REQUEST_NOT_FOUND)?;

    let friendship = queries::set_friendship_status(&conn, &pending.id, status)?
        .or_not_found(msg::FRIEND_REQUEST_NOT_FOUND)?;

    Ok(Json(FriendRespondResponse {
        message: message.to_string(),
        friendship,
    }))
}

#[derive(Debug, Serialize)]
pub struct FriendListResponse {
    pub friends: Vec<FriendProfile>,
}

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Json<FriendListResponse>> {
    let conn = state.db.get()?;
    let friends = queries::list_accepted_friend_profiles(&conn, &user.id)?;
    Ok(Json(FriendListResponse { friends }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/friends/request", post(request_friend))
        .route("/friends/respond", post(respond_friend))
        .route("/friends/list", get(list_friends))
        .route_layer(axum::middleware::from_fn_with_state(state, require_user))
}
