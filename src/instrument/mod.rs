//! Instrumentation Module
//!
//! Call counting and call history as wrappers around any [`Operation`],
//! composed by chaining:
//!
//! ```ignore
//! let store_op = StoreOperation::new(typed, "Cache.store")
//!     .count_calls(store.clone())
//!     .call_history(store.clone());
//! ```
//!
//! Each wrapper observes a call exactly once regardless of nesting order.

mod count;
mod history;
mod operation;
mod repr;

pub use count::CountCalls;
pub use history::CallHistory;
pub use operation::{operation, FnOperation, Instrument, Operation};
pub use repr::{float_repr, CallArgs, Repr};
