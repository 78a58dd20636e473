//! Memory Store Module
//!
//! In-process key-value store with lazy expiry on access and an explicit
//! sweep for the background cleanup task.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use super::{expiry_ms, resolve_range, Clock, Entry, KeyValueStore, Slot, StoreStats, SystemClock};
use crate::error::{CacheError, Result};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    stats: StoreStats,
}

impl Inner {
    /// Drops `key` if it has expired. Returns true when an entry was dropped.
    fn purge_if_expired(&mut self, key: &str, now: u64) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now));
        if expired {
            self.entries.remove(key);
            self.stats.record_expired(1);
        }
        expired
    }
}

// == Memory Store ==
/// Key-value store held in process memory.
///
/// Every mutation runs under one write guard, which is what makes
/// `increment` and `append` atomic.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store driven by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }

    fn write_scalar(&self, key: &str, value: &[u8], ttl_ms: Option<u64>) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.write();
        inner.entries.insert(
            key.to_string(),
            Entry::new(Slot::Scalar(value.to_vec()), now, ttl_ms),
        );
        let total = inner.entries.len();
        inner.stats.set_total_keys(total);
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        let mut stats = inner.stats.clone();
        stats.set_total_keys(inner.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));

        let count = before - inner.entries.len();
        inner.stats.record_expired(count);
        let total = inner.entries.len();
        inner.stats.set_total_keys(total);
        count
    }

    // == Length ==
    /// Returns the number of keys currently held, expired or not.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.write();
        inner.purge_if_expired(key, now);

        let value = match inner.entries.get(key) {
            Some(Entry {
                slot: Slot::Scalar(bytes),
                ..
            }) => Some(bytes.clone()),
            Some(_) => return Err(CacheError::WrongType(key.to_string())),
            None => None,
        };

        if value.is_some() {
            inner.stats.record_hit();
            debug!(key = key, "store hit");
        } else {
            inner.stats.record_miss();
            debug!(key = key, "store miss");
        }
        Ok(value)
    }

    fn peek(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.now_ms();
        let inner = self.inner.read();

        match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.slot {
                Slot::Scalar(bytes) => Ok(Some(bytes.clone())),
                Slot::List(_) => Err(CacheError::WrongType(key.to_string())),
            },
            _ => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.write_scalar(key, value, None);
        Ok(())
    }

    fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let ttl_ms = expiry_ms(key, ttl)?;
        self.write_scalar(key, value, Some(ttl_ms));
        Ok(())
    }

    fn increment(&self, key: &str) -> Result<i64> {
        let now = self.clock.now_ms();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        inner.purge_if_expired(key, now);

        let next = match inner.entries.get_mut(key) {
            Some(entry) => {
                let Slot::Scalar(bytes) = &mut entry.slot else {
                    return Err(CacheError::WrongType(key.to_string()));
                };
                let current: i64 = std::str::from_utf8(bytes.as_slice())
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        CacheError::Decode(format!("value at {} is not an integer", key))
                    })?;
                let next = current.checked_add(1).ok_or_else(|| {
                    CacheError::Decode(format!("increment of {} would overflow", key))
                })?;
                // Keeps any expiry already set on the counter
                *bytes = next.to_string().into_bytes();
                next
            }
            None => {
                inner.entries.insert(
                    key.to_string(),
                    Entry::new(Slot::Scalar(b"1".to_vec()), now, None),
                );
                1
            }
        };

        let total = inner.entries.len();
        inner.stats.set_total_keys(total);
        Ok(next)
    }

    fn append(&self, list_key: &str, value: &[u8]) -> Result<usize> {
        let now = self.clock.now_ms();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        inner.purge_if_expired(list_key, now);

        let entry = inner
            .entries
            .entry(list_key.to_string())
            .or_insert_with(|| Entry::new(Slot::List(Vec::new()), now, None));
        let len = match &mut entry.slot {
            Slot::List(items) => {
                items.push(value.to_vec());
                items.len()
            }
            Slot::Scalar(_) => return Err(CacheError::WrongType(list_key.to_string())),
        };

        let total = inner.entries.len();
        inner.stats.set_total_keys(total);
        Ok(len)
    }

    fn range(&self, list_key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
        let now = self.clock.now_ms();
        let inner = self.inner.read();

        match inner.entries.get(list_key) {
            Some(entry) if !entry.is_expired(now) => match &entry.slot {
                Slot::List(items) => Ok(resolve_range(items.len(), start, end)
                    .map(|(from, to)| items[from..=to].to_vec())
                    .unwrap_or_default()),
                Slot::Scalar(_) => Err(CacheError::WrongType(list_key.to_string())),
            },
            _ => Ok(Vec::new()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let now = self.clock.now_ms();
        let inner = self.inner.read();
        Ok(inner
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.write();
        let removed = match inner.entries.remove(key) {
            Some(entry) => !entry.is_expired(now),
            None => false,
        };
        let total = inner.entries.len();
        inner.stats.set_total_keys(total);
        Ok(removed)
    }

    fn flush(&self) -> Result<()> {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.stats.set_total_keys(0);
        debug!("store flushed");
        Ok(())
    }
}
