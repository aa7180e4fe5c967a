//! Mapping from service errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relief_core::AppError;
use serde_json::json;

/// An [`AppError`] on its way out as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_retryable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else if matches!(self.0, AppError::Generation(_)) {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Query failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self.0, "Query rejected");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
