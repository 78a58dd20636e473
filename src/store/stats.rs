//! Store Statistics Module
//!
//! Tracks read hits and misses and how many entries expired.

use serde::Serialize;

// == Store Stats ==
/// Counters kept by the in-memory store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Reads that found a live value
    pub hits: u64,
    /// Reads that found nothing (absent or expired)
    pub misses: u64,
    /// Entries dropped because their expiry passed
    pub expired: u64,
    /// Current number of keys in the store
    pub total_keys: usize,
}

impl StoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing has been read yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }

    pub fn set_total_keys(&mut self, count: usize) {
        self.total_keys = count;
    }
}
