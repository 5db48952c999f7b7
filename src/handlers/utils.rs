// handlers/utils.rs - Shared request parsing for handlers

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::services::PageRequest;
use crate::state::AppState;

pub type QueryParams = HashMap<String, String>;

/// `page`/`limit` from the query string, validated against the pagination config.
pub fn page_request(state: &AppState, params: &QueryParams) -> Result<PageRequest, ApiError> {
    let pagination = &state.config.pagination;
    Ok(PageRequest::parse(
        params.get("page").map(String::as_str),
        params.get("limit").map(String::as_str),
        pagination.default_limit,
        pagination.max_limit,
    )?)
}

pub fn param<'a>(params: &'a QueryParams, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

/// Unwraps a JSON body, mapping extractor rejections to `INVALID_JSON`.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    let Json(value) = body?;
    Ok(value)
}
