// handlers/public/csrf.rs - POST /api/csrf handler

use axum::{extract::State, http::HeaderMap};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::csrf::SESSION_HEADER;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/csrf - Issue a CSRF token bound to the `x-session-id` header
///
/// ```json
/// { "success": true, "data": { "csrfToken": "<64 hex chars>" } }
/// ```
pub async fn csrf_issue(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("Session ID required"))?;

    let token = state.csrf.generate(session_id).await?;
    Ok(ApiResponse::success(json!({ "csrfToken": token })))
}
