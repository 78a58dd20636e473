//! Expiring Fetch Cache Module
//!
//! Counts every request for a target and serves repeated requests from the
//! store until the cached body expires.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::origin::Origin;
use crate::cache::{decode_integer, decode_text};
use crate::error::{CacheError, Result};
use crate::instrument::Operation;
use crate::keys::{fetch_body_key, fetch_count_key};
use crate::store::StoreHandle;

/// How long a fetched body is served from the store by default.
pub const DEFAULT_FETCH_TTL: Duration = Duration::from_secs(10);

/// Shortest expiry a fetched body can be given.
pub const MIN_FETCH_TTL: Duration = Duration::from_millis(1);

/// Identity used when the fetch cache itself is instrumented.
pub const FETCH_IDENTITY: &str = "get_page";

/// Parses `target` as an http(s) URL and returns its canonical form.
pub fn normalize_target(target: &str) -> Result<String> {
    let url = Url::parse(target.trim())
        .map_err(|e| CacheError::InvalidRequest(format!("invalid URL {:?}: {}", target, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(CacheError::InvalidRequest(format!(
            "unsupported scheme {:?} in {:?}",
            other, target
        ))),
    }
}

/// Result of one fetch.
///
/// Displays as the body, which is what call history records.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    /// The normalized target
    pub url: String,
    pub body: String,
    /// Requests made for this target so far, this one included
    pub request_count: u64,
}

impl fmt::Display for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

// == Expiring Fetch Cache ==
/// Request-counting, expiring cache in front of an [`Origin`].
pub struct ExpiringFetchCache {
    store: StoreHandle,
    origin: Arc<dyn Origin>,
    ttl: Duration,
}

impl ExpiringFetchCache {
    pub fn new(store: StoreHandle, origin: Arc<dyn Origin>) -> Self {
        Self {
            store,
            origin,
            ttl: DEFAULT_FETCH_TTL,
        }
    }

    /// Sets how long fetched bodies stay cached, at least [`MIN_FETCH_TTL`].
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        if ttl < MIN_FETCH_TTL {
            warn!(ttl_ms = ttl.as_millis() as u64, "fetch ttl too short, using 1ms");
        }
        self.ttl = ttl.max(MIN_FETCH_TTL);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Fetch ==
    /// Returns the body for `target`, from the store if a live copy exists,
    /// otherwise from the origin.
    ///
    /// The request counter is bumped before anything else, so failed fetches
    /// are counted. Failures are never cached.
    pub fn fetch(&self, target: &str) -> Result<String> {
        self.fetch_page(target).map(|fetched| fetched.body)
    }

    /// Like [`fetch`](Self::fetch), also returning the normalized target and
    /// the request count this call produced.
    pub fn fetch_page(&self, target: &str) -> Result<Fetched> {
        let url = normalize_target(target)?;
        let count = self.store.increment(&fetch_count_key(&url))?;
        let request_count = count.max(0) as u64;

        let body_key = fetch_body_key(&url);
        if let Some(body) = self.store.get(&body_key)? {
            debug!(url = %url, count, "fetch cache hit");
            let body = decode_text(body)?;
            return Ok(Fetched {
                url,
                body,
                request_count,
            });
        }

        let response = self.origin.fetch_external(&url)?;
        if !response.is_success() {
            return Err(CacheError::origin(
                url,
                format!("status {}", response.status),
            ));
        }

        self.store
            .set_with_expiry(&body_key, response.body.as_bytes(), self.ttl)?;
        info!(url = %url, count, ttl_secs = self.ttl.as_secs(), "fetched from origin");
        Ok(Fetched {
            url,
            body: response.body,
            request_count,
        })
    }

    /// Number of fetches requested for `target`, including failed ones.
    pub fn request_count(&self, target: &str) -> Result<u64> {
        let target = normalize_target(target)?;
        match self.store.peek(&fetch_count_key(&target))? {
            Some(bytes) => Ok(decode_integer(bytes)?.max(0) as u64),
            None => Ok(0),
        }
    }
}

impl Operation for ExpiringFetchCache {
    type Args = (String,);
    type Output = Fetched;

    fn identity(&self) -> &str {
        FETCH_IDENTITY
    }

    fn invoke(&self, (target,): (String,)) -> Result<Fetched> {
        self.fetch_page(&target)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::fetch::OriginResponse;
    use crate::store::{KeyValueStore, ManualClock, MemoryStore};

    struct CountingOrigin {
        calls: AtomicUsize,
        status: u16,
    }

    impl CountingOrigin {
        fn new(status: u16) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                status,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Origin for CountingOrigin {
        fn fetch_external(&self, target: &str) -> Result<OriginResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(OriginResponse {
                status: self.status,
                body: format!("{} #{}", target, n),
            })
        }
    }

    fn setup(status: u16) -> (ExpiringFetchCache, Arc<CountingOrigin>, ManualClock, Arc<MemoryStore>) {
        let clock = ManualClock::new(0);
        let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
        let origin = CountingOrigin::new(status);
        let cache = ExpiringFetchCache::new(store.clone(), origin.clone());
        (cache, origin, clock, store)
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(
            normalize_target("HTTP://Example.TEST").unwrap(),
            "http://example.test/"
        );
        assert_eq!(
            normalize_target("http://example.test/x").unwrap(),
            "http://example.test/x"
        );
        assert!(matches!(
            normalize_target("not a url"),
            Err(CacheError::InvalidRequest(_))
        ));
        assert!(matches!(
            normalize_target("ftp://example.test/"),
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_second_fetch_within_window_hits_cache() {
        let (cache, origin, clock, _) = setup(200);

        let first = cache.fetch("http://example.test/x").unwrap();
        clock.advance(Duration::from_secs(5));
        let second = cache.fetch("http://example.test/x").unwrap();

        assert_eq!(first, second);
        assert_eq!(origin.calls(), 1);
        assert_eq!(cache.request_count("http://example.test/x").unwrap(), 2);
    }

    #[test]
    fn test_fetch_after_expiry_goes_to_origin() {
        let (cache, origin, clock, _) = setup(200);

        cache.fetch("http://example.test/x").unwrap();
        clock.advance(Duration::from_secs(5));
        cache.fetch("http://example.test/x").unwrap();
        clock.advance(Duration::from_secs(6));
        let third = cache.fetch("http://example.test/x").unwrap();

        assert_eq!(origin.calls(), 2);
        assert_eq!(third, "http://example.test/x #2");
        assert_eq!(cache.request_count("http://example.test/x").unwrap(), 3);
    }

    #[test]
    fn test_custom_ttl() {
        let (cache, origin, clock, _) = setup(200);
        let cache = cache.with_ttl(Duration::from_secs(1));
        assert_eq!(cache.ttl(), Duration::from_secs(1));

        cache.fetch("http://example.test/").unwrap();
        clock.advance(Duration::from_millis(1_500));
        cache.fetch("http://example.test/").unwrap();

        assert_eq!(origin.calls(), 2);
    }

    #[test]
    fn test_zero_ttl_is_raised_to_minimum() {
        let (cache, origin, _, _) = setup(200);
        let cache = cache.with_ttl(Duration::ZERO);
        assert_eq!(cache.ttl(), MIN_FETCH_TTL);

        assert_eq!(
            cache.fetch("http://example.test/").unwrap(),
            "http://example.test/ #1"
        );
        assert_eq!(cache.fetch("http://example.test/").unwrap(), "http://example.test/ #1");
        assert_eq!(origin.calls(), 1);
    }

    #[test]
    fn test_fetch_page_reports_its_own_count() {
        let (cache, _, _, _) = setup(200);

        let first = cache.fetch_page("http://EXAMPLE.test").unwrap();
        let second = cache.fetch_page("http://example.test/").unwrap();

        assert_eq!(first.url, "http://example.test/");
        assert_eq!(first.request_count, 1);
        assert_eq!(second.request_count, 2);
        assert_eq!(second.to_string(), second.body);
    }

    #[test]
    fn test_origin_failure_is_counted_but_not_cached() {
        let (cache, origin, _, store) = setup(500);

        let result = cache.fetch("http://example.test/down");
        assert!(matches!(result, Err(CacheError::OriginFetch { .. })));
        assert!(cache.fetch("http://example.test/down").is_err());

        assert_eq!(origin.calls(), 2);
        assert_eq!(cache.request_count("http://example.test/down").unwrap(), 2);
        assert!(!store
            .exists(&fetch_body_key("http://example.test/down"))
            .unwrap());
    }

    #[test]
    fn test_transport_error_propagates() {
        let store = Arc::new(MemoryStore::new());
        let origin = |target: &str| -> Result<OriginResponse> {
            Err(CacheError::origin(target, "connection refused"))
        };
        let cache = ExpiringFetchCache::new(store, Arc::new(origin));

        assert!(matches!(
            cache.fetch("http://example.test/"),
            Err(CacheError::OriginFetch { .. })
        ));
        assert_eq!(cache.request_count("http://example.test/").unwrap(), 1);
    }

    #[test]
    fn test_targets_are_counted_separately() {
        let (cache, _, _, _) = setup(200);

        cache.fetch("http://example.test/a").unwrap();
        cache.fetch("http://example.test/a").unwrap();
        cache.fetch("http://example.test/b").unwrap();

        assert_eq!(cache.request_count("http://example.test/a").unwrap(), 2);
        assert_eq!(cache.request_count("http://example.test/b").unwrap(), 1);
        assert_eq!(cache.request_count("http://example.test/c").unwrap(), 0);
    }

    #[test]
    fn test_equivalent_urls_share_a_record() {
        let (cache, origin, _, _) = setup(200);

        cache.fetch("http://EXAMPLE.test").unwrap();
        cache.fetch("http://example.test/").unwrap();

        assert_eq!(origin.calls(), 1);
        assert_eq!(cache.request_count("http://example.test").unwrap(), 2);
    }

    #[test]
    fn test_invalid_target_is_not_counted() {
        let (cache, origin, _, store) = setup(200);

        assert!(cache.fetch("nope").is_err());
        assert_eq!(origin.calls(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_body_is_still_a_hit() {
        let store = Arc::new(MemoryStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let origin = move |_: &str| -> Result<OriginResponse> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(OriginResponse::ok(""))
        };
        let cache = ExpiringFetchCache::new(store, Arc::new(origin));

        assert_eq!(cache.fetch("http://example.test/empty").unwrap(), "");
        assert_eq!(cache.fetch("http://example.test/empty").unwrap(), "");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
