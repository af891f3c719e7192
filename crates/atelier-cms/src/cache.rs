//! Single-flight cache for CMS content.
//!
//! Marketing copy changes only when an administrator edits it, so the site
//! serves page content from a process-wide cache that is filled once and
//! cleared explicitly after an admin write. The cache is an ordinary object
//! constructed at startup and passed by reference; it keeps no module-scope
//! state.
//!
//! Concurrency contract: at most one upstream fetch is in flight per cache,
//! no matter how many tasks call [`ContentCache::get`] at once. Callers that
//! arrive during a fetch wait for it and share its result. A failed fetch
//! caches nothing, so the next caller retries.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use atelier_core::Result;
use atelier_telemetry::MetricsRecorder;
use tokio::sync::Mutex;

/// Boxed future returned by the injected fetch function.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// A one-value cache with single-flight fill and explicit invalidation.
pub struct ContentCache<T> {
    fetch: Box<dyn Fn() -> FetchFuture<T> + Send + Sync>,
    slot: Mutex<Option<T>>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl<T: Clone + Send> ContentCache<T> {
    /// Create a cache around the given fetch function.
    ///
    /// The function is invoked on cache misses only; its result becomes the
    /// cached value until [`invalidate`](Self::invalidate) is called.
    pub fn new<F>(fetch: F) -> Self
    where
        F: Fn() -> FetchFuture<T> + Send + Sync + 'static,
    {
        Self {
            fetch: Box::new(fetch),
            slot: Mutex::new(None),
            metrics: None,
        }
    }

    /// Attach a shared `MetricsRecorder` so lookups emit hit/miss counts.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Return the cached value, fetching it first if the cache is empty.
    ///
    /// Holding the slot lock across the fetch is what provides the
    /// single-flight guarantee: concurrent callers queue on the lock and
    /// find the winner's value already stored.
    pub async fn get(&self) -> Result<T> {
        let mut slot = self.slot.lock().await;

        if let Some(value) = slot.as_ref() {
            if let Some(metrics) = &self.metrics {
                metrics.record_content_cache(true);
            }
            return Ok(value.clone());
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_content_cache(false);
        }

        let value = (self.fetch)().await?;
        *slot = Some(value.clone());
        Ok(value)
    }

    /// Drop the cached value so the next [`get`](Self::get) refetches.
    ///
    /// Called after an administrative content update; there is no other
    /// eviction.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
        tracing::debug!("content cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::AtelierError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_cache(fetches: Arc<AtomicUsize>) -> ContentCache<String> {
        ContentCache::new(move || {
            let fetches = Arc::clone(&fetches);
            let fut: FetchFuture<String> = Box::pin(async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                // Give concurrent callers time to pile up on the lock.
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok("home copy".to_string())
            });
            fut
        })
    }

    #[tokio::test]
    async fn get_fills_once_and_serves_from_cache() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(Arc::clone(&fetches));

        assert_eq!(cache.get().await.unwrap(), "home copy");
        assert_eq!(cache.get().await.unwrap(), "home copy");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(counting_cache(Arc::clone(&fetches)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.get().await.unwrap() }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), "home copy");
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(Arc::clone(&fetches));

        cache.get().await.unwrap();
        cache.invalidate().await;
        cache.get().await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let fetches_for_cache = Arc::clone(&fetches);
        let cache: ContentCache<String> = ContentCache::new(move || {
            let n = fetches_for_cache.fetch_add(1, Ordering::SeqCst);
            let fut: FetchFuture<String> = Box::pin(async move {
                if n == 0 {
                    Err(AtelierError::cms("delivery API unavailable"))
                } else {
                    Ok("recovered".to_string())
                }
            });
            fut
        });

        assert!(cache.get().await.is_err());
        assert_eq!(cache.get().await.unwrap(), "recovered");
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
