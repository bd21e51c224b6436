use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::core::pipeline::PipelineError;

/// Error code returned when speech synthesis stays rate limited after all retries
pub const AZURE_TTS_RATE_LIMIT: &str = "AZURE_TTS_RATE_LIMIT";

/// Application error type
#[derive(Debug)]
pub enum AppError {
    InternalServerError(String),
    BadRequest(String),
    /// Upstream rate limit exhausted; carries a machine-readable code
    RateLimited { message: String, code: &'static str },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                json!({
                    "error": "Internal server error",
                    "status": status.as_u16()
                })
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                json!({
                    "error": msg,
                    "status": status.as_u16()
                })
            }
            AppError::RateLimited { message, code } => {
                tracing::warn!("Rate limited ({}): {}", code, message);
                json!({
                    "error": "Speech synthesis rate limit exceeded, please try again later",
                    "status": status.as_u16(),
                    "code": code
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::RateLimited { message, code } => write!(f, "Rate limited ({code}): {message}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(msg) => AppError::BadRequest(msg),
            PipelineError::RateLimitExceeded(msg) => AppError::RateLimited {
                message: msg,
                code: AZURE_TTS_RATE_LIMIT,
            },
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
