//! Expiry Sweep Task
//!
//! Expired entries are already invisible to reads; this task reclaims their
//! memory so keys that are never read again do not pile up.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a task that sweeps expired entries out of `store` every
/// `cleanup_interval_secs` seconds.
///
/// # Arguments
/// * `store` - The in-memory store to sweep
/// * `cleanup_interval_secs` - Seconds between sweeps (values below 1 are raised to 1)
///
/// # Returns
/// A JoinHandle that can be aborted on shutdown.
pub fn spawn_cleanup_task(store: Arc<MemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "Starting expiry sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired();
            if removed > 0 {
                info!(removed, "Expiry sweep removed entries");
            } else {
                debug!("Expiry sweep found nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, ManualClock};

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = ManualClock::new(0);
        let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
        store
            .set_with_expiry("cache:http://example.test/", b"body", Duration::from_secs(10))
            .unwrap();
        clock.advance(Duration::from_secs(11));

        let handle = spawn_cleanup_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(store.is_empty(), "expired entry should have been swept");
        assert_eq!(store.stats().expired, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_live_entries() {
        let store = Arc::new(MemoryStore::new());
        store.set("kept", b"value").unwrap();
        store.increment("count:http://example.test/").unwrap();
        store
            .set_with_expiry("long_lived", b"value", Duration::from_secs(3600))
            .unwrap();

        let handle = spawn_cleanup_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("kept").unwrap(), Some(b"value".to_vec()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let store = Arc::new(MemoryStore::new());

        let handle = spawn_cleanup_task(store, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "task should be finished after abort");
    }
}
