// handlers/protected/messages.rs - GET /api/users/:id/messages handler

use axum::{
    extract::{Path, Query, State},
    Extension,
};

use crate::database::models::Message;
use crate::error::ApiError;
use crate::handlers::utils::{param, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::messages::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::services::{MessageService, PageRequest};
use crate::state::AppState;

/// GET /api/users/:id/messages?limit= - Sent and received, newest first
pub async fn user_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Vec<Message>> {
    if !auth.can_access(&id) {
        return Err(ApiError::forbidden("Access denied"));
    }
    let limit = PageRequest::parse(None, param(&params, "limit"), DEFAULT_LIMIT, MAX_LIMIT)?.limit;

    let messages = MessageService::new(state.store.clone()).conversation(&id, limit).await?;
    Ok(ApiResponse::success(messages))
}
