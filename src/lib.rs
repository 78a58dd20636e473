//! Replay Cache - an instrumented key-value caching layer
//!
//! Typed store/retrieve over a key-value store, call counting and call
//! history for any operation, replay of recorded calls, and an expiring
//! cache in front of slow origin fetches.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod instrument;
pub mod keys;
pub mod models;
pub mod replay;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, TypedCache, Value};
pub use config::Config;
pub use error::{CacheError, Result};
pub use fetch::ExpiringFetchCache;
pub use instrument::{operation, Instrument, Operation};
pub use replay::{replay, Transcript};
pub use store::{KeyValueStore, MemoryStore, StoreHandle};
pub use tasks::spawn_cleanup_task;
