//! API Handlers
//!
//! HTTP request handlers for each endpoint. The cache core is synchronous,
//! so every handler hands its work to the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::{decode_float, decode_integer, decode_text, Cache, Value};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::fetch::{ExpiringFetchCache, HttpOrigin, Origin};
use crate::instrument::{CallHistory, CountCalls, Instrument, Operation};
use crate::models::{
    DecodeAs, FetchParams, FetchResponse, HealthResponse, RetrieveParams, RetrieveResponse,
    StatsResponse, StoreRequest, StoreResponse,
};
use crate::replay::{replay, Transcript};
use crate::store::{MemoryStore, StoreHandle};

/// The fetch cache as served over HTTP: counted and recorded as `get_page`.
pub type PageFetcher = CallHistory<CountCalls<ExpiringFetchCache>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store shared by the typed cache, the fetch cache and replay
    pub store: StoreHandle,
    /// Set when `store` is the in-memory store, for stats and the sweep task
    pub memory: Option<Arc<MemoryStore>>,
    pub cache: Arc<Cache>,
    pub pages: Arc<PageFetcher>,
    backend: &'static str,
}

impl AppState {
    fn build(
        store: StoreHandle,
        memory: Option<Arc<MemoryStore>>,
        origin: Arc<dyn Origin>,
        fetch_ttl: Duration,
        backend: &'static str,
    ) -> Self {
        let pages = ExpiringFetchCache::new(store.clone(), origin)
            .with_ttl(fetch_ttl)
            .count_calls(store.clone())
            .call_history(store.clone());
        Self {
            cache: Arc::new(Cache::new(store.clone())),
            pages: Arc::new(pages),
            store,
            memory,
            backend,
        }
    }

    /// Creates state over the in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>, origin: Arc<dyn Origin>, fetch_ttl: Duration) -> Self {
        Self::build(store.clone(), Some(store), origin, fetch_ttl, "memory")
    }

    /// Creates state over any other store. `/stats` is unavailable.
    pub fn with_store(store: StoreHandle, origin: Arc<dyn Origin>, fetch_ttl: Duration) -> Self {
        Self::build(store, None, origin, fetch_ttl, "external")
    }

    /// Creates state from configuration.
    ///
    /// Uses Redis when `REDIS_URL` is set and the `redis` feature is
    /// enabled, the in-memory store otherwise. Must be called outside the
    /// async runtime because it builds a blocking HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let origin: Arc<dyn Origin> =
            Arc::new(HttpOrigin::new(Duration::from_secs(config.origin_timeout))?);
        let fetch_ttl = Duration::from_secs(config.fetch_ttl);

        #[cfg(feature = "redis")]
        {
            if let Some(url) = &config.redis_url {
                let store = Arc::new(crate::store::RedisStore::connect(url)?);
                return Ok(Self::build(store, None, origin, fetch_ttl, "redis"));
            }
        }

        #[cfg(not(feature = "redis"))]
        {
            if config.redis_url.is_some() {
                tracing::warn!("REDIS_URL is set but the redis feature is disabled; using the in-memory store");
            }
        }

        Ok(Self::in_memory(Arc::new(MemoryStore::new()), origin, fetch_ttl))
    }

    /// Name of the backing store, as reported by `/health`.
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

/// Runs synchronous cache work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CacheError::Internal(format!("worker task failed: {}", e)))?
}

/// Handler for PUT /store
///
/// Stores a scalar under a freshly generated key.
pub async fn store_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>> {
    let value = Value::from(req.value);
    let key = run_blocking(move || state.cache.store(value)).await?;
    Ok(Json(StoreResponse::new(key)))
}

/// Handler for GET /retrieve/:key
///
/// Returns the stored value decoded as text (default), integer or float.
pub async fn retrieve_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<RetrieveParams>,
) -> Result<Json<RetrieveResponse>> {
    let lookup = key.clone();
    let value = run_blocking(move || {
        let typed = state.cache.typed();
        let value: Option<serde_json::Value> = match params.decode.unwrap_or_default() {
            DecodeAs::Text => typed.retrieve(&lookup, decode_text)?.map(serde_json::Value::from),
            DecodeAs::Integer => typed.retrieve(&lookup, decode_integer)?.map(serde_json::Value::from),
            DecodeAs::Float => typed.retrieve(&lookup, decode_float)?.map(serde_json::Value::from),
        };
        Ok(value)
    })
    .await?;

    match value {
        Some(value) => Ok(Json(RetrieveResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /replay/:identity
///
/// Returns the recorded calls of any instrumented operation.
pub async fn replay_handler(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<Transcript>> {
    let transcript = run_blocking(move || replay(state.store.as_ref(), &identity)).await?;
    Ok(Json(transcript))
}

/// Handler for GET /fetch?url=...
///
/// Serves the target through the expiring fetch cache.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Json<FetchResponse>> {
    let fetched = run_blocking(move || state.pages.invoke((params.url,))).await?;
    Ok(Json(FetchResponse {
        url: fetched.url,
        body: fetched.body,
        request_count: fetched.request_count,
    }))
}

/// Handler for GET /stats
///
/// Returns in-memory store statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    match &state.memory {
        Some(memory) => Ok(Json(StatsResponse::from(memory.stats()))),
        None => Err(CacheError::InvalidRequest(format!(
            "statistics are not kept by the {} store",
            state.backend
        ))),
    }
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::STORE_IDENTITY;
    use crate::fetch::OriginResponse;
    use crate::models::ScalarInput;
    use crate::store::KeyValueStore;

    fn test_state() -> AppState {
        let origin = |target: &str| -> Result<OriginResponse> {
            if target.contains("down") {
                Ok(OriginResponse {
                    status: 503,
                    body: String::new(),
                })
            } else {
                Ok(OriginResponse::ok(format!("<html>{}</html>", target)))
            }
        };
        AppState::in_memory(
            Arc::new(MemoryStore::new()),
            Arc::new(origin),
            Duration::from_secs(10),
        )
    }

    fn store_request(value: ScalarInput) -> Json<StoreRequest> {
        Json(StoreRequest { value })
    }

    #[tokio::test]
    async fn test_store_and_retrieve_handler() {
        let state = test_state();

        let stored = store_handler(
            State(state.clone()),
            store_request(ScalarInput::Text("hello".to_string())),
        )
        .await
        .unwrap();

        let response = retrieve_handler(
            State(state.clone()),
            Path(stored.key.clone()),
            Query(RetrieveParams::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.value, serde_json::json!("hello"));
    }

    #[tokio::test]
    async fn test_retrieve_as_integer() {
        let state = test_state();
        let stored = store_handler(State(state.clone()), store_request(ScalarInput::Integer(42)))
            .await
            .unwrap();

        let response = retrieve_handler(
            State(state),
            Path(stored.key.clone()),
            Query(RetrieveParams {
                decode: Some(DecodeAs::Integer),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.value, serde_json::json!(42));
    }

    #[tokio::test]
    async fn test_retrieve_decode_failure() {
        let state = test_state();
        let stored = store_handler(
            State(state.clone()),
            store_request(ScalarInput::Text("abc".to_string())),
        )
        .await
        .unwrap();

        let result = retrieve_handler(
            State(state),
            Path(stored.key.clone()),
            Query(RetrieveParams {
                decode: Some(DecodeAs::Integer),
            }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::Decode(_))));
    }

    #[tokio::test]
    async fn test_retrieve_missing_key() {
        let state = test_state();

        let result = retrieve_handler(
            State(state),
            Path("nonexistent".to_string()),
            Query(RetrieveParams::default()),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replay_handler_lists_store_calls() {
        let state = test_state();
        for value in ["a", "b"] {
            store_handler(
                State(state.clone()),
                store_request(ScalarInput::Text(value.to_string())),
            )
            .await
            .unwrap();
        }

        let transcript = replay_handler(State(state), Path(STORE_IDENTITY.to_string()))
            .await
            .unwrap();
        assert_eq!(transcript.count, 2);
        assert_eq!(transcript.calls[0].input, "('a',)");
        assert_eq!(transcript.calls[1].input, "('b',)");
    }

    #[tokio::test]
    async fn test_fetch_handler_counts_requests() {
        let state = test_state();
        let params = || {
            Query(FetchParams {
                url: "http://example.test/page".to_string(),
            })
        };

        let first = fetch_handler(State(state.clone()), params()).await.unwrap();
        let second = fetch_handler(State(state.clone()), params()).await.unwrap();

        assert_eq!(first.request_count, 1);
        assert_eq!(second.request_count, 2);
        assert_eq!(second.body, "<html>http://example.test/page</html>");

        let transcript = replay_handler(State(state), Path("get_page".to_string()))
            .await
            .unwrap();
        assert_eq!(transcript.count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_report_distinct_counts() {
        let state = test_state();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move {
                    fetch_handler(
                        State(state),
                        Query(FetchParams {
                            url: "http://example.test/busy".to_string(),
                        }),
                    )
                    .await
                    .map(|response| response.request_count)
                })
            })
            .collect();

        let mut counts = Vec::new();
        for task in tasks {
            counts.push(task.await.unwrap().unwrap());
        }
        counts.sort_unstable();
        assert_eq!(counts, (1..=8).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_zero_fetch_ttl_still_serves_pages() {
        let origin = |_: &str| -> Result<OriginResponse> { Ok(OriginResponse::ok("body")) };
        let state = AppState::in_memory(
            Arc::new(MemoryStore::new()),
            Arc::new(origin),
            Duration::ZERO,
        );

        let response = fetch_handler(
            State(state),
            Query(FetchParams {
                url: "http://example.test/".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.body, "body");
    }

    #[tokio::test]
    async fn test_fetch_handler_origin_failure() {
        let state = test_state();

        let result = fetch_handler(
            State(state.clone()),
            Query(FetchParams {
                url: "http://down.test/".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::OriginFetch { .. })));
        assert!(!state.store.exists("cache:http://down.test/").unwrap());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await.unwrap();
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
    }

    #[tokio::test]
    async fn test_stats_unavailable_without_memory_store() {
        let origin = |_: &str| -> Result<OriginResponse> { Ok(OriginResponse::ok("")) };
        let state = AppState::with_store(
            Arc::new(MemoryStore::new()),
            Arc::new(origin),
            Duration::from_secs(10),
        );

        assert!(stats_handler(State(state)).await.is_err());
    }

    #[test]
    fn test_health_handler() {
        let response = tokio_test::block_on(health_handler(State(test_state())));
        assert_eq!(response.status, "healthy");
        assert_eq!(response.store, "memory");
    }
}
