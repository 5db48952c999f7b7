// handlers/elevated/users.rs - Admin user management handlers
//
// POST   /api/users
// DELETE /api/users/:id
// PATCH  /api/admin/users/:id/approve

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

use crate::database::models::{collections, timestamp, User};
use crate::database::{Repository, StoreError};
use crate::error::ApiError;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::users::new_user_from_body;
use crate::state::AppState;

fn users(state: &AppState) -> Repository<User> {
    Repository::new(collections::USERS, state.store.clone())
}

fn user_not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound { .. } => ApiError::not_found("User not found"),
        other => other.into(),
    }
}

/// POST /api/users - Create a user record; `uid` becomes its id
pub async fn user_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<User> {
    let user = new_user_from_body(json_body(body)?, Utc::now())?;

    users(&state).insert(&user.id, &user).await.map_err(|err| match err {
        StoreError::AlreadyExists { .. } => ApiError::conflict("User already exists"),
        other => other.into(),
    })?;

    info!("User {} created by {}", user.id, auth.id());
    Ok(ApiResponse::created(user).message("User created successfully"))
}

/// DELETE /api/users/:id
pub async fn user_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    users(&state).delete(&id).await.map_err(user_not_found)?;

    info!("User {} deleted by {}", id, auth.id());
    Ok(ApiResponse::message_only("User deleted successfully"))
}

/// PATCH /api/admin/users/:id/approve - Body `{ "approved": bool }`
pub async fn user_approve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<User> {
    let body = json_body(body)?;
    let approved = body
        .get("approved")
        .and_then(Value::as_bool)
        .ok_or_else(|| ApiError::bad_request("Approved status must be a boolean"))?;

    let mut changes = Map::new();
    changes.insert("verification.adminApproved".to_string(), Value::Bool(approved));
    changes.insert("updatedAt".to_string(), Value::String(timestamp::format(&Utc::now())));

    let users = users(&state);
    users.update(&id, &changes).await.map_err(user_not_found)?;
    let user = users.select_404(&id).await.map_err(user_not_found)?;

    info!("User {} approval set to {} by {}", id, approved, auth.id());
    let message = if approved { "User approved" } else { "User approval revoked" };
    Ok(ApiResponse::success(user).message(message))
}
