// handlers/protected/checkin.rs - POST /api/events/:id/checkin handler

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::events::CheckInRequest;
use crate::services::EventService;
use crate::state::AppState;

/// POST /api/events/:id/checkin - Add the caller to the attendee set
///
/// Body is optional: `{ "method": "qr" | "manual" | "digital", "points": 10 }`.
/// Repeating a check-in returns 200 without a new attendance record.
pub async fn event_checkin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    let request: CheckInRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CheckInRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let outcome = EventService::new(state.store.clone())
        .check_in(&id, &auth.user, request, Utc::now())
        .await?;

    let recorded = outcome.attendance.is_some();
    let data = json!({ "event": outcome.event, "attendance": outcome.attendance });
    Ok(if recorded {
        ApiResponse::created(data).message("Checked in successfully")
    } else {
        ApiResponse::success(data).message("Already checked in")
    })
}
