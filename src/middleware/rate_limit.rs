use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Client key: first `x-forwarded-for` entry, else the socket address, else
/// `unknown`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Fixed-window limit on `/api` requests per client.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    if !request.uri().path().starts_with("/api") {
        return Ok(next.run(request).await);
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer);

    let decision = state.rate_limiter.check(&client).await?;
    if !decision.allowed {
        warn!("Rate limit exceeded for {} ({} requests)", client, decision.count);
        return Err(ApiError::too_many_requests("Rate limit exceeded"));
    }
    Ok(next.run(request).await)
}
