//! Replay Cache server
//!
//! Serves the typed cache, replay and the expiring fetch cache over HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use replay_cache::api::{create_router, AppState};
use replay_cache::{spawn_cleanup_task, Config};

/// Main entry point for the server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the store, the caches and the origin client
/// 4. Start the runtime and the expiry sweep (in-memory store only)
/// 5. Serve the router until SIGINT/SIGTERM
///
/// The state is built before the runtime exists because the origin client
/// is blocking, and blocking clients may not be created or dropped inside
/// an async context.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replay_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Replay Cache server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        fetch_ttl_secs = config.fetch_ttl,
        origin_timeout_secs = config.origin_timeout,
        cleanup_interval_secs = config.cleanup_interval,
        redis = config.redis_url.is_some(),
        "Configuration loaded"
    );

    let state = AppState::from_config(&config).context("failed to build application state")?;
    info!(store = state.backend(), "Store initialized");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    let result = runtime.block_on(serve(state.clone(), &config));
    drop(runtime);
    drop(state);

    info!("Server shutdown complete");
    result
}

async fn serve(state: AppState, config: &Config) -> anyhow::Result<()> {
    let cleanup_handle = state.memory.clone().map(|memory| {
        info!("Background expiry sweep started");
        spawn_cleanup_task(memory, config.cleanup_interval)
    });

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep task.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Expiry sweep task aborted");
    }
}
