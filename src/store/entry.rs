//! Store Entry Module
//!
//! Defines the structure for individual store entries with expiry support.

// == Slot ==
/// What a key holds: a single opaque value or an ordered list of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Scalar(Vec<u8>),
    List(Vec<Vec<u8>>),
}

// == Entry ==
/// Represents a single stored entry with value and metadata.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub slot: Slot,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl Entry {
    // == Constructor ==
    /// Creates a new entry at time `now_ms`, expiring `ttl_ms` later if given.
    pub fn new(slot: Slot, now_ms: u64, ttl_ms: Option<u64>) -> Self {
        Self {
            slot,
            expires_at: ttl_ms.map(|ttl| now_ms.saturating_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }
}
