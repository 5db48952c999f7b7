// handlers/protected/badges.rs - GET /api/users/:id/badges handler

use axum::extract::{Path, State};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::badges::EarnedBadge;
use crate::services::BadgeService;
use crate::state::AppState;

/// GET /api/users/:id/badges - Awards joined with their badge, newest first
pub async fn user_badges(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<EarnedBadge>> {
    let badges = BadgeService::new(state.store.clone()).earned_by(&id).await?;
    Ok(ApiResponse::success(badges))
}
