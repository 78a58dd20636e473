//! Store key derivation.
//!
//! Counters, call logs and fetch records all live in the same store, so every
//! key is built here.

/// Counter of calls made to the operation named `identity`.
pub fn counter_key(identity: &str) -> String {
    identity.to_string()
}

/// List of rendered arguments, one per call.
pub fn inputs_key(identity: &str) -> String {
    format!("{}:inputs", identity)
}

/// List of rendered results, one per successful call.
pub fn outputs_key(identity: &str) -> String {
    format!("{}:outputs", identity)
}

/// Number of fetches requested for `target`.
pub fn fetch_count_key(target: &str) -> String {
    format!("count:{}", target)
}

/// Cached origin body for `target`.
pub fn fetch_body_key(target: &str) -> String {
    format!("cache:{}", target)
}
