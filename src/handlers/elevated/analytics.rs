// handlers/elevated/analytics.rs - GET /api/admin/analytics handler

use axum::extract::State;
use chrono::Utc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Analytics, AnalyticsService};
use crate::state::AppState;

pub async fn analytics_get(State(state): State<AppState>) -> ApiResult<Analytics> {
    let analytics = AnalyticsService::new(state.store.clone()).compute(Utc::now()).await?;
    Ok(ApiResponse::success(analytics))
}
