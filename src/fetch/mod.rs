//! Fetch Module
//!
//! A TTL cache for origin fetches that shares the key-value store with the
//! typed cache.

mod cache;
mod origin;

pub use cache::{
    normalize_target, ExpiringFetchCache, Fetched, DEFAULT_FETCH_TTL, FETCH_IDENTITY,
    MIN_FETCH_TTL,
};
pub use origin::{HttpOrigin, Origin, OriginResponse};
