//! Background Tasks Module
//!
//! Periodic work that runs alongside the server.
//!
//! # Tasks
//! - Expiry sweep: drops expired entries from the in-memory store

mod cleanup;

pub use cleanup::spawn_cleanup_task;
