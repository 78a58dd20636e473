//! Request and Response models for the HTTP API
//!
//! DTOs used to (de)serialize request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{DecodeAs, FetchParams, RetrieveParams, ScalarInput, StoreRequest};
pub use responses::{
    ErrorResponse, FetchResponse, HealthResponse, RetrieveResponse, StatsResponse, StoreResponse,
};
