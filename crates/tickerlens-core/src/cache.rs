//! In-memory response caching for market-data fetches.
//!
//! [`CachedSource`] wraps any [`MarketDataSource`] and serves repeated
//! requests for the same ticker and window from a [`CacheStore`] until the
//! entry's TTL elapses. The snapshot builder cannot tell a hit from a miss.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::data_source::{HealthStatus, HistoryFuture, HistoryRequest, MarketDataSource};
use crate::{DateRange, MarketData, ProviderId, Symbol};

/// Defines how a call interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present;
    /// otherwise fetch upstream and store the response. (Default)
    #[default]
    Use,
    /// Always fetch upstream, bypassing any cached entry,
    /// and store the new response.
    Refresh,
    /// Always fetch upstream and neither read nor write the cache.
    Bypass,
}

/// Cache key: ticker plus resolved window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: Symbol,
    pub range: DateRange,
}

impl From<&HistoryRequest> for CacheKey {
    fn from(value: &HistoryRequest) -> Self {
        Self {
            symbol: value.symbol.clone(),
            range: value.range,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL reaches past the clock's range; such entries never expire.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now <= expires_at)
    }
}

#[derive(Debug)]
struct CacheInner<K, V> {
    map: HashMap<K, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<K, V> CacheInner<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.map
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    fn put(&mut self, key: K, value: V, ttl_override: Option<Duration>) {
        let ttl = ttl_override.unwrap_or(self.default_ttl);
        self.clear_expired();
        let expires_at = Instant::now().checked_add(ttl);
        self.map.insert(key, CacheEntry { value, expires_at });
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.is_live(now));
    }
}

/// Thread-safe in-memory TTL cache.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<K, V>>>,
}

impl<K, V> Clone for CacheStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a cache store with a default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new(default_ttl))),
        }
    }

    /// Create a disabled cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Get a value if it exists and hasn't expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let store = self.inner.read().await;
        store.get(key)
    }

    /// Store a value, using `ttl_override` instead of the default TTL when given.
    ///
    /// Expired entries are purged before inserting. No-op when the cache is disabled.
    pub async fn put(&self, key: K, value: V, ttl_override: Option<Duration>) {
        let mut store = self.inner.write().await;
        if store.default_ttl == Duration::ZERO {
            return;
        }
        store.put(key, value, ttl_override);
    }

    /// Remove expired entries.
    pub async fn clear_expired(&self) {
        self.inner.write().await.clear_expired();
    }

    /// Remove all entries.
    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Number of entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_disabled(&self) -> bool {
        self.inner.read().await.default_ttl == Duration::ZERO
    }
}

/// Store type used for history responses.
pub type HistoryCache = CacheStore<CacheKey, MarketData>;

/// Caching decorator around a [`MarketDataSource`].
///
/// Only successful fetches are stored, so a transient outage is retried on
/// the next request instead of being replayed for a whole TTL.
pub struct CachedSource<S> {
    inner: S,
    cache: HistoryCache,
    mode: CacheMode,
}

impl<S> CachedSource<S>
where
    S: MarketDataSource,
{
    pub fn new(inner: S, cache: HistoryCache) -> Self {
        Self {
            inner,
            cache,
            mode: CacheMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> MarketDataSource for CachedSource<S>
where
    S: MarketDataSource,
{
    fn id(&self) -> ProviderId {
        self.inner.id()
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(async move {
            let key = CacheKey::from(&req);

            if self.mode == CacheMode::Use {
                if let Some(hit) = self.cache.get(&key).await {
                    debug!(symbol = %key.symbol, range = %key.range, "history cache hit");
                    return Ok(hit);
                }
                debug!(symbol = %key.symbol, range = %key.range, "history cache miss");
            }

            let data = self.inner.fetch_history(req).await?;

            if self.mode != CacheMode::Bypass {
                self.cache.put(key, data.clone(), None).await;
            }

            Ok(data)
        })
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        self.inner.health()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_store_basic_operations() {
        let cache: CacheStore<String, u32> = CacheStore::new(Duration::from_secs(1));

        assert!(cache.get(&"key1".to_string()).await.is_none());

        cache.put("key1".to_string(), 1, None).await;
        assert_eq!(cache.get(&"key1".to_string()).await, Some(1));

        cache.put("key1".to_string(), 2, None).await;
        assert_eq!(cache.get(&"key1".to_string()).await, Some(2));
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache: CacheStore<&str, u32> = CacheStore::new(Duration::from_millis(100));

        cache.put("key1", 1, None).await;
        assert!(cache.get(&"key1").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get(&"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_override() {
        let cache: CacheStore<&str, u32> = CacheStore::new(Duration::from_secs(60));

        cache.put("key1", 1, Some(Duration::from_millis(100))).await;

        assert!(cache.get(&"key1").await.is_some());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get(&"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_beyond_clock_range_never_expires() {
        let cache: CacheStore<&str, u32> = CacheStore::new(Duration::from_secs(u64::MAX));

        cache.put("key1", 1, None).await;
        cache.put("key2", 2, Some(Duration::MAX)).await;

        assert_eq!(cache.get(&"key1").await, Some(1));
        assert_eq!(cache.get(&"key2").await, Some(2));
        cache.clear_expired().await;
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_put_purges_expired_entries() {
        let cache: CacheStore<&str, u32> = CacheStore::new(Duration::from_secs(60));

        cache.put("stale1", 1, Some(Duration::from_millis(50))).await;
        cache.put("stale2", 2, Some(Duration::from_millis(50))).await;
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(100)).await;
        cache.put("fresh", 3, None).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&"fresh").await, Some(3));
    }

    #[tokio::test]
    async fn test_cache_clear_expired() {
        let cache: CacheStore<&str, u32> = CacheStore::new(Duration::from_millis(100));

        cache.put("key1", 1, None).await;
        cache.put("key2", 2, None).await;
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.clear_expired().await;

        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_clear_all() {
        let cache: CacheStore<&str, u32> = CacheStore::new(Duration::from_secs(60));

        cache.put("key1", 1, None).await;
        cache.put("key2", 2, None).await;
        cache.clear().await;

        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let cache: CacheStore<&str, u32> = CacheStore::disabled();

        assert!(cache.is_disabled().await);

        cache.put("key1", 1, None).await;
        assert!(cache.get(&"key1").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache: CacheStore<&str, u32> = CacheStore::new(Duration::from_secs(60));
        let other = cache.clone();

        cache.put("key1", 7, None).await;
        assert_eq!(other.get(&"key1").await, Some(7));
    }

    #[test]
    fn test_cache_mode_default() {
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }
}
