// handlers/protected/auth.rs - POST /api/auth/register and GET /api/auth/whoami

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::Value;
use tracing::info;

use crate::database::models::{collections, User};
use crate::database::{Repository, StoreError};
use crate::error::ApiError;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthIdentity, AuthUser};
use crate::services::users::{registered_student, RegisterRequest};
use crate::state::AppState;

/// POST /api/auth/register - Create the caller's own student profile
///
/// The token subject becomes the user id. New students start unapproved.
pub async fn register(
    State(state): State<AppState>,
    Extension(AuthIdentity(claims)): Extension<AuthIdentity>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<User> {
    let request: RegisterRequest = serde_json::from_value(json_body(body)?)?;
    let user = registered_student(&claims.sub, claims.email.as_deref(), claims.name.as_deref(), request)?;

    let users = Repository::<User>::new(collections::USERS, state.store.clone());
    users.insert(&user.id, &user).await.map_err(|err| match err {
        StoreError::AlreadyExists { .. } => ApiError::conflict("User already registered"),
        other => other.into(),
    })?;

    info!("Registered student {}", user.id);
    Ok(ApiResponse::created(user).message("Registration submitted for approval"))
}

/// GET /api/auth/whoami - The resolved caller
pub async fn whoami(Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    Ok(ApiResponse::success(auth.user))
}
