//! Error types for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use toolgen_api_gateway::GenerateError;
use toolgen_forge::{ManifestError, ParseError, PersistError};

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing request input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Local misconfiguration, e.g. a missing API key.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The generation service failed or answered with something unusable.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Model output did not follow the tool format.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Persistence could not start.
    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Configuration(_) => "configuration_error",
            Self::Upstream(_) => "upstream_error",
            Self::Parse(_) => "parse_error",
            Self::Persist(_) => "persist_error",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<GenerateError> for AppError {
    fn from(error: GenerateError) -> Self {
        if error.is_configuration() {
            Self::Configuration(error.to_string())
        } else {
            Self::Upstream(error.to_string())
        }
    }
}

impl From<ManifestError> for AppError {
    fn from(error: ManifestError) -> Self {
        match &error {
            ManifestError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                Self::NotFound(error.to_string())
            }
            _ => Self::Internal(error.to_string()),
        }
    }
}
