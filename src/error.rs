use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{AbortError, ApplyError, PlanError},
};

/// Errors that can occur in service layer operations.
///
/// Every host-facing operation surfaces one of these instead of panicking or
/// leaking backend error types; the route layer turns them into HTTP
/// responses whose message tells the host whether nothing was applied
/// (safe to retry) or a multi-step sequence stopped halfway (`Partial`,
/// resolved by the resync recovery action).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend call failed; nothing was applied.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Malformed input to a creation or update call; nothing was applied.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Status or game-status change not allowed from the current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    /// Referenced team, question set, or question index does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A precondition depended on data now known to be stale.
    #[error("stale data: {0}")]
    Stale(String),
    /// A multi-step sequence failed after committing earlier steps.
    #[error("partially applied, run resync: {0}")]
    Partial(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidTransition(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Stale(message) => {
                AppError::Conflict(format!("stale data, retry after resync: {message}"))
            }
            ServiceError::Partial(message) => {
                AppError::Internal(format!("partially applied, run resync: {message}"))
            }
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::AlreadyPending => {
                ServiceError::InvalidTransition("another transition is already pending".into())
            }
            PlanError::InvalidTransition(invalid) => {
                ServiceError::InvalidTransition(invalid.to_string())
            }
        }
    }
}

impl From<ApplyError> for ServiceError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::NoPending => {
                ServiceError::InvalidTransition("no transition is pending".into())
            }
            ApplyError::IdMismatch { .. } => {
                ServiceError::InvalidTransition("pending transition does not match".into())
            }
            ApplyError::StatusMismatch { expected, actual } => {
                ServiceError::InvalidTransition(format!(
                    "status changed during transition (expected {expected:?}, got {actual:?})"
                ))
            }
            ApplyError::VersionMismatch { expected, actual } => {
                ServiceError::InvalidTransition(format!(
                    "version mismatch during transition (expected {expected}, got {actual})"
                ))
            }
        }
    }
}

impl From<AbortError> for ServiceError {
    fn from(err: AbortError) -> Self {
        match err {
            AbortError::NoPending => {
                ServiceError::InvalidTransition("no pending transition".into())
            }
            AbortError::IdMismatch { .. } => {
                ServiceError::InvalidTransition("transition plan does not match".into())
            }
        }
    }
}
