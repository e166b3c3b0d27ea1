use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use sea_orm::TransactionError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard JSON error body returned by every handler.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Whether the caller may safely retry the request
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    #[serde(default)]
    pub retryable: bool,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Error taxonomy for the inventory core.
///
/// Everything a service can fail with maps onto one of these. Failures inside
/// an atomic block abort the whole transaction; nothing here leaves the
/// ledger half-written.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Wraps a database error, surfacing lock/serialization contention as a
    /// transient `ConcurrencyConflict` the caller may retry.
    pub fn db_error(error: DbErr) -> Self {
        if is_lock_contention(&error) {
            ServiceError::ConcurrencyConflict(error.to_string())
        } else {
            ServiceError::DatabaseError(error)
        }
    }

    /// Shortfall-carrying constructor used by reserve/transfer paths.
    pub fn insufficient_stock(available: i32, requested: i32) -> Self {
        ServiceError::InsufficientStock {
            available,
            requested,
        }
    }

    /// Safe to retry without caller-side changes?
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }

    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidState(_) | Self::InsufficientStock { .. } => StatusCode::CONFLICT,
            Self::ConcurrencyConflict(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn response_message(&self) -> String {
        match self {
            // Internal detail stays out of client responses.
            Self::DatabaseError(_) => "A database error occurred".to_string(),
            Self::InternalError(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

fn is_lock_contention(err: &DbErr) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("deadlock")
        || msg.contains("lock timeout")
        || msg.contains("could not serialize")
        || msg.contains("database is locked")
}

impl From<TransactionError<ServiceError>> for ServiceError {
    fn from(err: TransactionError<ServiceError>) -> Self {
        match err {
            TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
            TransactionError::Transaction(service_err) => service_err,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            retryable: self.is_transient(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
