//! Time-bounded in-memory response cache

use crate::constants::CACHE_TIMEOUT_SECS;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A cached payload and when it was fetched
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub payload: V,
    pub fetched_at: Instant,
}

impl<V> CacheEntry<V> {
    /// True while the entry is younger than `timeout`
    pub fn is_fresh(&self, timeout: Duration) -> bool {
        self.fetched_at.elapsed() < timeout
    }
}

/// Cache of fetched payloads keyed by request identity
///
/// Expiry is lazy: an old entry stays in the map until a later fetch for the
/// same key overwrites it. The lock is never held while the fetcher runs, so
/// two concurrent misses for one key both reach the network.
pub struct FetchCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    timeout: Duration,
}

impl<V: Clone> FetchCache<V> {
    /// Creates a cache with the default five minute timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(CACHE_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the fresh payload for `key`, or runs `fetcher` and stores its result
    ///
    /// A failed fetch writes nothing and leaves any expired entry in place.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(payload) = self.get_fresh(key).await {
            tracing::debug!(key, "Cache hit");
            return Ok(payload);
        }

        tracing::debug!(key, "Cache miss, fetching");
        let payload = fetcher().await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                payload: payload.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(payload)
    }

    /// Gets the payload for `key` if it has not expired
    pub async fn get_fresh(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.timeout))
            .map(|entry| entry.payload.clone())
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

impl<V: Clone> Default for FetchCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
