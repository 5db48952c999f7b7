// HTTP API Error Types
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::cache::CacheError;
use crate::database::StoreError;
use crate::filter::FilterError;
use crate::services::events::EventError;
use crate::services::pagination::PaginationError;
use crate::services::users::UserWriteError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError { .. } | ApiError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Error envelope: `{success: false, error, code, fieldErrors?}`
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["fieldErrors"] = json!(field_errors);
        }

        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Validation failure for a set of missing required fields.
    pub fn missing_fields(message: impl Into<String>, fields: &[&str]) -> Self {
        let field_errors = fields
            .iter()
            .map(|field| (field.to_string(), "This field is required".to_string()))
            .collect();
        ApiError::validation_error(message, Some(field_errors))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    fn internal(cause: &dyn std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", cause);
        ApiError::internal_server_error("Internal server error")
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::not_found(err.to_string()),
            StoreError::AlreadyExists { .. } => ApiError::conflict(err.to_string()),
            StoreError::Filter(filter_err) => ApiError::from(filter_err),
            other => ApiError::internal(&other),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::JsonError(_) => ApiError::internal(&err),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::InvalidParameter { ref name, .. } => {
                let mut field_errors = HashMap::new();
                field_errors.insert(name.to_string(), "Must be a positive integer".to_string());
                ApiError::validation_error(err.to_string(), Some(field_errors))
            }
            PaginationError::Store(store_err) => ApiError::from(store_err),
        }
    }
}

impl From<UserWriteError> for ApiError {
    fn from(err: UserWriteError) -> Self {
        match err {
            UserWriteError::MissingFields(ref fields) => ApiError::missing_fields(err.to_string(), fields),
            UserWriteError::AdminOnlyField(_) => ApiError::forbidden(err.to_string()),
            UserWriteError::NotAnObject => ApiError::bad_request(err.to_string()),
            UserWriteError::Invalid(_) => ApiError::validation_error(err.to_string(), None),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::MissingFields(ref fields) => ApiError::missing_fields(err.to_string(), fields),
            EventError::InvalidDate { field, .. } => {
                let mut field_errors = HashMap::new();
                field_errors.insert(field.to_string(), "Invalid date".to_string());
                ApiError::validation_error(err.to_string(), Some(field_errors))
            }
            EventError::NotAnObject | EventError::Closed(_) => ApiError::bad_request(err.to_string()),
            EventError::Invalid(_) => ApiError::validation_error(err.to_string(), None),
            EventError::NotFound => ApiError::not_found(err.to_string()),
            EventError::Full => ApiError::conflict(err.to_string()),
            EventError::Store(store_err) => ApiError::from(store_err),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidSecret => ApiError::internal(&err),
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::internal(&err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidJson(rejection.body_text())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation_error(format!("Invalid request body: {}", err), None)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_error_envelope() {
        let err = ApiError::forbidden("Account pending approval");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_json(),
            json!({ "success": false, "error": "Account pending approval", "code": "FORBIDDEN" })
        );
    }

    #[test]
    fn validation_errors_carry_fields() {
        let err = ApiError::missing_fields("Title is required", &["title"]);
        let body = err.to_json();
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));
        assert_eq!(body["fieldErrors"]["title"], json!("This field is required"));
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let missing: ApiError = StoreError::not_found("users", "u1").into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let duplicate: ApiError = StoreError::already_exists("users", "u1").into();
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

        let broken: ApiError = StoreError::ConfigMissing("DATABASE_URL").into();
        assert_eq!(broken.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(broken.message(), "Internal server error");
    }

    #[test]
    fn bad_pagination_is_a_validation_error() {
        let err: ApiError = PaginationError::InvalidParameter {
            name: "page",
            value: "0".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_json()["fieldErrors"]["page"], json!("Must be a positive integer"));
    }
}
