//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::repository::RepositoryError;
use crate::models::GridError;
use crate::services::{GenerationError, ServiceError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Stale version or forbidden status change
    Conflict(String),
    /// Solver answered with something unusable
    BadGateway(String),
    /// Solver not reachable
    ServiceUnavailable(String),
    /// Solver did not answer in time
    GatewayTimeout(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ApiError::new("CONFLICT", msg)),
            AppError::BadGateway(msg) => {
                (StatusCode::BAD_GATEWAY, ApiError::new("SOLVER_ERROR", msg))
            }
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("SOLVER_UNAVAILABLE", msg),
            ),
            AppError::GatewayTimeout(msg) => (
                StatusCode::GATEWAY_TIMEOUT,
                ApiError::new("SOLVER_TIMEOUT", msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) => {
                if e.is_not_found() {
                    (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", e.to_string()))
                } else {
                    error!(error = %e, "Repository failure");
                    let api = ApiError::new("REPOSITORY_ERROR", "Storage operation failed")
                        .with_details(e.to_string());
                    (StatusCode::INTERNAL_SERVER_ERROR, api)
                }
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<GridError> for AppError {
    fn from(err: GridError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::InvalidInput(msg) => AppError::BadRequest(msg),
            e @ ServiceError::VersionConflict { .. } => AppError::Conflict(e.to_string()),
            ServiceError::InvalidTransition(e) => AppError::Conflict(e.to_string()),
            ServiceError::Generation(e) => match e {
                GenerationError::Solver(msg) => AppError::BadRequest(msg),
                GenerationError::Unavailable(_) => AppError::ServiceUnavailable(
                    "Solver service is not running. Please start the solver service.".to_string(),
                ),
                GenerationError::Timeout => AppError::GatewayTimeout(
                    "Timetable generation timed out. Try reducing constraints.".to_string(),
                ),
                other => AppError::BadGateway(other.to_string()),
            },
            ServiceError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
