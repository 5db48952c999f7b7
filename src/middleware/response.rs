use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::services::pagination::Pagination;

/// Success envelope: `{success: true, data, message?, pagination?}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
            message: None,
            pagination: None,
        }
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::success(data)
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::success(data)
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<Value> {
    /// Message-only response without data.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self::success(Value::Null).message(message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(true));
        if !data_value.is_null() {
            envelope.insert("data".to_string(), data_value);
        }
        if let Some(message) = self.message {
            envelope.insert("message".to_string(), Value::String(message));
        }
        if let Some(pagination) = self.pagination {
            envelope.insert("pagination".to_string(), json!(pagination));
        }

        (status, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pagination::PageRequest;

    async fn body_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn paginated_envelope() {
        let response = ApiResponse::paginated(vec![1, 2], Pagination::new(&PageRequest::new(1, 2), 5)).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_of(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"], json!([1, 2]));
        assert_eq!(body["pagination"]["totalPages"], json!(3));
        assert_eq!(body["pagination"]["hasNext"], json!(true));
    }

    #[tokio::test]
    async fn message_without_data() {
        let response = ApiResponse::message_only("User deleted successfully").into_response();
        let body = body_of(response).await;
        assert_eq!(body, json!({ "success": true, "message": "User deleted successfully" }));
    }

    #[tokio::test]
    async fn created_status() {
        let response = ApiResponse::created(json!({ "_id": "x" })).message("Created").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
