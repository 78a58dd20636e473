//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the store, the typed cache and the fetch cache.
///
/// A missing key is not an error: lookups return `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found (only raised at the HTTP boundary)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Stored bytes could not be converted to the requested type
    #[error("Decode failure: {0}")]
    Decode(String),

    /// The origin fetch failed or returned a non-success status
    #[error("Fetch of {target} failed: {reason}")]
    OriginFetch { target: String, reason: String },

    /// The backing store could not be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Operation against a key holding the wrong kind of value
    #[error("Wrong type for key: {0}")]
    WrongType(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Builds an `OriginFetch` error for `target`.
    pub fn origin(target: impl Into<String>, reason: impl ToString) -> Self {
        CacheError::OriginFetch {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Decode(_) => StatusCode::BAD_REQUEST,
            CacheError::OriginFetch { .. } => StatusCode::BAD_GATEWAY,
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::WrongType(_) => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
