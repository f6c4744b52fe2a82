//! Error types for the lookup service
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::storage::Lifecycle;

// == Database Error Enum ==
/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Requested id is absent from the active store
    #[error("user not found: {0}")]
    NotFound(String),

    /// `initialize` was called on a backend that already left `Uninitialized`
    #[error("database already initialized")]
    AlreadyInitialized,

    /// Operation requires a `Ready` backend
    #[error("database is not ready (state: {0})")]
    NotReady(Lifecycle),

    /// Record file exists but could not be read or parsed
    #[error("failed to load records from {}: {reason}", .path.display())]
    LoadFailed { path: PathBuf, reason: String },

    /// Record file could not be written
    #[error("failed to save records to {}: {reason}", .path.display())]
    SaveFailed { path: PathBuf, reason: String },

    /// Caller cancelled a blocking operation
    #[error("operation cancelled")]
    Cancelled,
}

// == Lookup Error Enum ==
/// User-facing errors produced by the lookup service.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    /// Global cooldown window has not elapsed
    #[error("Too many requests")]
    RateLimited,

    /// No id supplied
    #[error("Missing user ID")]
    MissingId,

    /// Backend reported the id absent
    #[error("User not found")]
    NotFound,

    /// Backend is not serving (not ready, cancelled)
    #[error("Database unavailable")]
    Unavailable,
}

impl From<DatabaseError> for LookupError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotReady(_) | DatabaseError::Cancelled => LookupError::Unavailable,
            _ => LookupError::NotFound,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = match &self {
            LookupError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            LookupError::MissingId => StatusCode::BAD_REQUEST,
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Config Error Enum ==
/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// == Result Type Alias ==
/// Convenience Result type for storage operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
