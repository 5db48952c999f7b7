// handlers/public/events.rs - GET /api/events and GET /api/events/:id handlers

use axum::extract::{Path, Query, State};

use crate::database::models::{collections, Event};
use crate::error::ApiError;
use crate::handlers::utils::{page_request, param, QueryParams};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{EventService, ListQuery, TextSearch};
use crate::state::AppState;

/// GET /api/events?status=&type=&search=&limit=&page=
///
/// Sorted by `startDate` ascending; `search` is a case-insensitive title
/// prefix match.
pub async fn events_list(State(state): State<AppState>, Query(params): Query<QueryParams>) -> ApiResult<Vec<Event>> {
    let page = page_request(&state, &params)?;
    let query = ListQuery::new(collections::EVENTS, "startDate", page)
        .where_eq_opt("status", param(&params, "status"))
        .where_eq_opt("type", param(&params, "type"))
        .search(param(&params, "search").and_then(|raw| TextSearch::new("titleLower", raw)));

    let page = state
        .pagination
        .fetch(&query)
        .await?
        .try_map(|doc| doc.into_model::<Event>(collections::EVENTS))?;
    let pagination = page.pagination();

    let events = page
        .items
        .into_iter()
        .map(|mut event| {
            event.normalize();
            event
        })
        .collect();
    Ok(ApiResponse::paginated(events, pagination))
}

/// GET /api/events/:id
pub async fn event_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Event> {
    let event = EventService::new(state.store.clone())
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    Ok(ApiResponse::success(event))
}
