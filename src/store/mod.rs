//! Store Module
//!
//! The key-value store boundary every other component is built on, with an
//! in-memory implementation and an optional Redis one.

mod clock;
mod entry;
mod memory;
mod stats;

#[cfg(feature = "redis")]
mod redis;

use std::sync::Arc;
use std::time::Duration;

use crate::error::{CacheError, Result};

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{Entry, Slot};
pub use memory::MemoryStore;
pub use stats::StoreStats;

#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Shared handle to a store, constructed once per process.
pub type StoreHandle = Arc<dyn KeyValueStore>;

// == Key Value Store ==
/// Operations the cache layer needs from its backing store.
///
/// Keys are strings and values are opaque bytes; conversions happen above
/// this boundary. `increment` and `append` must be atomic: callers never
/// read-modify-write through `get`/`set`.
pub trait KeyValueStore: Send + Sync {
    /// Reads a scalar value. Absent or expired keys yield `None`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Reads a scalar value without side effects on the store: nothing is
    /// purged and no hit or miss is recorded.
    fn peek(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get(key)
    }

    /// Writes a scalar value with no expiry, replacing whatever was there.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Writes a scalar value that disappears after `ttl`.
    ///
    /// A zero `ttl` is rejected; anything under a millisecond is rounded up.
    fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Adds one to the integer at `key` (absent counts as 0) and returns the
    /// new value.
    fn increment(&self, key: &str) -> Result<i64>;

    /// Pushes `value` onto the tail of the list at `list_key`, returning the
    /// new length.
    fn append(&self, list_key: &str, value: &[u8]) -> Result<usize>;

    /// Returns list elements from `start` to `end` inclusive. Negative
    /// indices count from the tail, so `range(k, 0, -1)` is the whole list.
    fn range(&self, list_key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// Removes a key of any kind. Returns whether something was removed.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every key.
    fn flush(&self) -> Result<()>;
}

/// Converts a write expiry to whole milliseconds, rounding up.
pub(crate) fn expiry_ms(key: &str, ttl: Duration) -> Result<u64> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidRequest(format!(
            "Expiry for {} must be positive",
            key
        )));
    }
    let ms = ttl.as_nanos().div_ceil(1_000_000);
    Ok(u64::try_from(ms).unwrap_or(u64::MAX))
}

/// Resolves inclusive, possibly negative list bounds against `len`.
///
/// Returns `None` when the range selects nothing.
pub(crate) fn resolve_range(len: usize, start: isize, end: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };

    if len == 0 || start > end || start >= len {
        None
    } else {
        Some((start as usize, end as usize))
    }
}
