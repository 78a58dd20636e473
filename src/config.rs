//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Lifetime in seconds of a cached origin response
    pub fetch_ttl: u64,
    /// Timeout in seconds for a single origin request
    pub origin_timeout: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Redis connection URL; the in-memory store is used when unset
    pub redis_url: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `FETCH_TTL` - Fetch cache expiry in seconds, 0 means default (default: 10)
    /// - `ORIGIN_TIMEOUT` - Origin request timeout in seconds, 0 means default (default: 5)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `REDIS_URL` - Redis URL, only honoured with the `redis` feature
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            fetch_ttl: positive_or(env_or("FETCH_TTL", defaults.fetch_ttl), defaults.fetch_ttl),
            origin_timeout: positive_or(
                env_or("ORIGIN_TIMEOUT", defaults.origin_timeout),
                defaults.origin_timeout,
            ),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Zero durations are meaningless here; they fall back to the default.
fn positive_or(value: u64, default: u64) -> u64 {
    if value == 0 {
        default
    } else {
        value
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            fetch_ttl: 10,
            origin_timeout: 5,
            cleanup_interval: 1,
            redis_url: None,
        }
    }
}
