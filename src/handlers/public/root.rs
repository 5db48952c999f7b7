// handlers/public/root.rs - GET / and GET /health handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET / - Service information
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Campus Hub API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Student community backend: users, events, badges, messages and analytics",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "csrf": "/api/csrf (public)",
                "events": "/api/events[/:id] (public read, admin create)",
                "checkin": "/api/events/:id/checkin (protected)",
                "auth": "/api/auth/register, /api/auth/whoami (protected)",
                "users": "/api/users[/:id[/badges|/messages]] (protected)",
                "admin": "/api/admin/users/:id/approve, /api/admin/analytics (admin)",
            }
        }
    }))
}

/// GET /health - Store connectivity check
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
