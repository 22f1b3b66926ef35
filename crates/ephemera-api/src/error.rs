//! Ephemera: API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ephemera_core::error::StoryError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The story store could not be opened or loaded.
    #[error("store error: {0}")]
    Store(#[from] StoryError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `StoryError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub StoryError);

impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            StoryError::UnsupportedMedia(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media")
            }
            StoryError::DecodeFailure(_) => (StatusCode::UNPROCESSABLE_ENTITY, "decode_failure"),
            StoryError::PersistenceRead(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_read_error")
            }
            StoryError::PersistenceWrite(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "persistence_write_error")
            }
            StoryError::StoryNotFound(_) => (StatusCode::NOT_FOUND, "story_not_found"),
            StoryError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            StoryError::ViewerUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "viewer_unavailable")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
