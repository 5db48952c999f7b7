// handlers/elevated/events.rs - POST /api/events handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::database::models::Event;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::events::new_event_from_body;
use crate::services::EventService;
use crate::state::AppState;

/// POST /api/events - Create an event
///
/// Requires `title`, `description`, `startDate` and `endDate`. The event
/// starts `upcoming` with no attendees.
pub async fn event_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Event> {
    let event = new_event_from_body(json_body(body)?, &auth.user, Utc::now())?;
    EventService::new(state.store.clone()).create(&event).await?;

    info!("Event {} created by {}", event.id, auth.id());
    Ok(ApiResponse::created(event).message("Event created successfully"))
}
