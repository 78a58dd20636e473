//! Response DTOs for the HTTP API
//!
//! Defines outgoing response bodies.

use serde::Serialize;

use crate::store::StoreStats;

/// Response body for `PUT /store`
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    /// The generated key
    pub key: String,
}

impl StoreResponse {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Response body for `GET /retrieve/:key`
#[derive(Debug, Clone, Serialize)]
pub struct RetrieveResponse {
    pub key: String,
    /// The decoded value as a JSON string or number
    pub value: serde_json::Value,
}

impl RetrieveResponse {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for `GET /fetch`
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    /// The normalized target
    pub url: String,
    pub body: String,
    /// Requests made for this target so far, this one included
    pub request_count: u64,
}

/// Response body for `GET /stats`
///
/// Only available when the server runs on the in-memory store.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub total_keys: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<StoreStats> for StatsResponse {
    fn from(stats: StoreStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expired: stats.expired,
            total_keys: stats.total_keys,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Name of the backing store
    pub store: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a healthy response stamped with the current time.
    pub fn healthy(store: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            store: store.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
