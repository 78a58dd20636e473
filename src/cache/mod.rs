//! Cache Module
//!
//! Typed store/retrieve over a key-value store, and the instrumented cache
//! built on it.

mod instrumented;
mod typed;
mod value;


// Re-export public types
pub use instrumented::{Cache, STORE_IDENTITY};
pub use typed::{StoreOperation, TypedCache};
pub use value::{decode_float, decode_integer, decode_text, Value};
