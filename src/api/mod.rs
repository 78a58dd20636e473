//! API Module
//!
//! HTTP handlers and routing.
//!
//! # Endpoints
//! - `PUT /store` - Store a scalar under a generated key
//! - `GET /retrieve/:key` - Retrieve a value, optionally decoded with `?as=`
//! - `GET /replay/:identity` - Recorded calls of an instrumented operation
//! - `GET /fetch?url=` - Fetch a page through the expiring cache
//! - `GET /stats` - In-memory store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
