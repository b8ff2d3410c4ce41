use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// Errors surfaced by the HTTP adapters
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body is not valid JSON of the expected shape
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::InvalidBody(e.to_string())
    }
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}
