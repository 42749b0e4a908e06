use axum::{extract::State, http::StatusCode, routing::post, Extension, Router};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::middleware::{require_user, AuthedUser};
use crate::models::{CreateGroup, Group};

#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateGroupResponse {
    pub message: &'static str,
    pub group: Group,
}

pub async fn create_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(request): Json<CreateGroupBody>,
) -> Result<(StatusCode, Json<CreateGroupResponse>)> {
    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Group name is required".into()))?;

    let mut conn = state.db.get()?;
    let group = queries::create_group_with_creator(
        &mut conn,
        &CreateGroup {
            name,
            creator_id: user.id.clone(),
        },
    )?;

    tracing::info!("Group created: {} ({}) by {}", group.name, group.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(CreateGroupResponse {
            message: "Group created successfully",
            group,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct JoinGroupBody {
    #[serde(default)]
    pub group_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JoinGroupResponse {
    pub message: &'static str,
}

pub async fn join_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(request): Json<JoinGroupBody>,
) -> Result<Json<JoinGroupResponse>> {
    let group_id = request
        .group_id
        .filter(|g| !g.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing group ID".into()))?;

    let conn = state.db.get()?;
    queries::get_group_by_id(&conn, &group_id)?.or_not_found(msg::GROUP_NOT_FOUND)?;

    // A repeat join is a success, not a conflict.
    let message = if queries::try_add_group_member(&conn, &group_id, &user.id)? {
        "Successfully joined the group"
    } else {
        "Already a member of this group"
    };

    Ok(Json(JoinGroupResponse { message }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/groups/create", post(create_group))
        .route("/groups/join", post(join_group))
        .route_layer(axum::middleware::from_fn_with_state(state, require_user))
}
