// handlers/protected/users.rs - GET/PATCH /api/users handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::database::models::{collections, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::SortDirection;
use crate::handlers::utils::{json_body, page_request, param, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::users::apply_update;
use crate::services::{ListQuery, TextSearch};
use crate::state::AppState;

/// GET /api/users?role=&search=&limit=&page=
///
/// Newest first; `search` matches a display name prefix, case-insensitive.
pub async fn users_list(State(state): State<AppState>, Query(params): Query<QueryParams>) -> ApiResult<Vec<User>> {
    let page = page_request(&state, &params)?;
    let query = ListQuery::new(collections::USERS, "createdAt", page)
        .sort_direction(SortDirection::Desc)
        .where_eq_opt("role", param(&params, "role"))
        .search(param(&params, "search").and_then(|raw| TextSearch::new("displayNameLower", raw)));

    let page = state
        .pagination
        .fetch(&query)
        .await?
        .try_map(|doc| doc.into_model::<User>(collections::USERS))?;
    let pagination = page.pagination();
    Ok(ApiResponse::paginated(page.items, pagination))
}

/// GET /api/users/:id
pub async fn user_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let user = Repository::<User>::new(collections::USERS, state.store.clone())
        .select_one(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(user))
}

/// PATCH /api/users/:id - Partial update by the user themselves or an admin
///
/// `_id`, `uid` and `createdAt` are ignored. Only admins may change `role`,
/// `verification` or `stats`.
pub async fn user_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<User> {
    if !auth.can_access(&id) {
        return Err(ApiError::forbidden("Access denied"));
    }
    let changes = json_body(body)?;

    let users = Repository::<User>::new(collections::USERS, state.store.clone());
    let current = users
        .select_one(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let updated = apply_update(&current, changes, auth.is_admin(), Utc::now())?;
    users.put(&id, &updated).await?;

    info!("User {} updated by {}", id, auth.id());
    Ok(ApiResponse::success(updated).message("User updated successfully"))
}
