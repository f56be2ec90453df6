use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors returned by the generation routes.
///
/// Rendered as `{"detail": "..."}`, the shape the generator client surfaces
/// verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Job not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, axum::Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
