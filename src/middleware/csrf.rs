use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";
pub const TOKEN_HEADER: &str = "x-csrf-token";

fn is_state_changing(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// Rejects state-changing requests without a valid session token pair.
/// Token issuance itself is exempt.
pub async fn csrf_guard(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    let path = request.uri().path();
    if !is_state_changing(request.method()) || !path.starts_with("/api") || path == "/api/csrf" {
        return Ok(next.run(request).await);
    }

    // Owned copies so no borrow of the request lives across the await.
    let credentials = {
        let headers = request.headers();
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
        (get(SESSION_HEADER), get(TOKEN_HEADER))
    };
    let (Some(session_id), Some(token)) = credentials else {
        return Err(ApiError::forbidden("Missing CSRF token"));
    };

    if !state.csrf.verify(&session_id, &token).await? {
        return Err(ApiError::forbidden("Invalid CSRF token"));
    }
    Ok(next.run(request).await)
}
