//! Origin boundary for the fetch cache.

use std::time::Duration;

use tracing::debug;

use crate::error::{CacheError, Result};

/// Status and body returned by an origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginResponse {
    pub status: u16,
    pub body: String,
}

impl OriginResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where fetch-cache misses are served from.
///
/// Transport failures are errors; HTTP error statuses are returned as a
/// response and judged by the caller.
pub trait Origin: Send + Sync {
    fn fetch_external(&self, target: &str) -> Result<OriginResponse>;
}

impl<F> Origin for F
where
    F: Fn(&str) -> Result<OriginResponse> + Send + Sync,
{
    fn fetch_external(&self, target: &str) -> Result<OriginResponse> {
        self(target)
    }
}

// == HTTP Origin ==
/// Blocking HTTP GET against the real target.
///
/// Must not be used from inside an async task; the server calls it from
/// `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: reqwest::blocking::Client,
}

impl HttpOrigin {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("http client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Origin for HttpOrigin {
    fn fetch_external(&self, target: &str) -> Result<OriginResponse> {
        debug!(url = target, "fetching from origin");
        let response = self
            .client
            .get(target)
            .send()
            .map_err(|e| CacheError::origin(target, e))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| CacheError::origin(target, e))?;
        Ok(OriginResponse { status, body })
    }
}
