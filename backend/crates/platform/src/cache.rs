//! Cache-aside TTL cache for read-mostly reference data.
//!
//! Thin wrapper over `moka::future::Cache`. Entries expire after a fixed TTL
//! and must be invalidated explicitly by whoever writes the underlying data.
//! The cache is process-local: several API instances do not share it.
//!
//! Every invalidation bumps a generation counter. A loader that was already
//! running when the counter moved does not get its result cached, so a read
//! that raced a write cannot repopulate the cache with the pre-write value.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;

/// One hour, the default lifetime of a cached reference-data entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

const DEFAULT_CAPACITY: u64 = 1_000;

#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, V>,
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self {
            inner,
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    /// Return the cached value, or run `loader` and cache what it returns.
    ///
    /// Errors are passed through and never cached. Concurrent misses on the
    /// same key may each run the loader; the last writer wins. A value loaded
    /// across an invalidation is returned to the caller but not cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, loader: F) -> Result<V, E>
    where
        K: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.inner.get(&key).await {
            return Ok(hit);
        }
        let started = self.generation.load(Ordering::Acquire);
        let value = loader().await?;
        if self.generation.load(Ordering::Acquire) != started {
            return Ok(value);
        }
        self.inner.insert(key.clone(), value.clone()).await;
        // An invalidation that landed between the check and the insert.
        if self.generation.load(Ordering::Acquire) != started {
            self.inner.invalidate(&key).await;
        }
        Ok(value)
    }

    pub async fn invalidate(&self, key: &K) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.invalidate_all();
    }

    /// Approximate entry count; flushes pending maintenance first so tests
    /// observe a settled value.
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
