//! API error types.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::config;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before any upstream call.
    #[error("Bad request: {error}")]
    BadRequest {
        error: String,
        details: Option<String>,
    },

    /// Upstream failure mapped to a user-facing message. `message` keeps the
    /// raw upstream diagnostic.
    #[error("Upstream error: {error} ({message})")]
    Upstream { error: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest {
            error: msg.into(),
            details: None,
        }
    }

    pub fn upstream(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            error: "Invalid request body".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest {
            error: "Invalid query parameters".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

/// JSON error body: `{error, message?, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::BadRequest { error, details } => ErrorResponse {
                error,
                message: None,
                details,
            },
            ApiError::Upstream { error, message } => ErrorResponse {
                error,
                message: Some(message),
                details: None,
            },
            ApiError::NotFound(msg) => ErrorResponse {
                error: msg,
                message: None,
                details: None,
            },
            ApiError::RateLimited => ErrorResponse {
                error: "Rate limit exceeded. Please try again later.".to_string(),
                message: None,
                details: None,
            },
            ApiError::Internal(msg) => {
                // Don't expose internal error details in production
                let details = if config::is_production() {
                    None
                } else {
                    Some(msg)
                };
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    message: None,
                    details,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
