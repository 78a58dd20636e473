//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    fetch_handler, health_handler, replay_handler, retrieve_handler, stats_handler,
    store_handler, AppState,
};

/// Creates the router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/store", put(store_handler))
        .route("/retrieve/:key", get(retrieve_handler))
        .route("/replay/:identity", get(replay_handler))
        .route("/fetch", get(fetch_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
