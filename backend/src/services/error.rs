//! Error type shared by the domain services.
//!
//! Validation conflicts are not errors: they travel as data in
//! [`ValidationOutcome`](super::conflicts::ValidationOutcome). This type covers
//! everything that stops a request outright.

use crate::db::repository::RepositoryError;
use crate::models::{GridError, StatusTransitionError};

use super::generation::GenerationError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Timetable, version, session or registry record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Request is malformed; rejected before any conflict scan.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another write changed the timetable first.
    #[error("Timetable was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict { expected: u32, actual: u32 },

    #[error(transparent)]
    InvalidTransition(#[from] StatusTransitionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, .. } => ServiceError::NotFound(message),
            RepositoryError::VersionConflict {
                expected, actual, ..
            } => ServiceError::VersionConflict { expected, actual },
            other => ServiceError::Repository(other),
        }
    }
}

impl From<GridError> for ServiceError {
    fn from(err: GridError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}
