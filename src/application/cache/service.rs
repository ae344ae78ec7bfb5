//! Generic TTL cache with tag-based invalidation.
//!
//! Values are stored as JSON so that any serializable type can share one
//! key space. The primary store and the inverted tag index live behind a
//! single lock, so a key and its tag memberships are always updated
//! together.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::entry::{CacheConfig, CacheEntry, CacheStats};
use crate::error::Result;

type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Primary store plus inverted tag index.
#[derive(Default)]
struct Store {
    entries: HashMap<String, CacheEntry>,
    tag_index: HashMap<String, HashSet<String>>,
}

impl Store {
    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.remove(&key);
        for tag in &entry.tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        for tag in &entry.tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        Some(entry)
    }
}

/// Handle for stopping the cache's background tasks.
pub struct CacheHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheHandle {
    /// Signal the background tasks to stop and wait for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Cache background task ended abnormally");
        }
    }
}

/// Exclusive write access to one key, released on drop.
pub struct KeyGuard<'a> {
    cache: &'a CacheService,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.cache
            .key_locks
            .remove_if(&self.key, |_, l| Arc::strong_count(l) == 1);
    }
}

/// In-memory key/value cache with per-entry TTL, tags, LRU eviction, and
/// background refresh.
pub struct CacheService {
    config: CacheConfig,
    store: Mutex<Store>,
    /// Per-key async locks serializing computation of the same key.
    key_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    refreshers: RwLock<HashMap<String, RefreshFn>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheService {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            store: Mutex::new(Store::default()),
            key_locks: DashMap::new(),
            refreshers: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a live value as raw JSON. Expired entries are purged on read.
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut store = self.store.lock();

        let Some(entry) = store.entries.get_mut(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if entry.is_valid_at(now) {
            entry.touch(now);
            let data = entry.data.clone();
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(data);
        }

        store.remove(key);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Get a live value, deserialized.
    ///
    /// A value that does not deserialize as `T` is treated as a miss.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape, ignoring");
                None
            }
        }
    }

    /// Store a value with no tags.
    pub fn set<T: Serialize + ?Sized>(&self, key: impl Into<String>, value: &T, ttl: Duration) {
        self.set_tagged(key, value, ttl, std::iter::empty::<String>());
    }

    /// Store a value under the given tags, replacing any existing entry.
    pub fn set_tagged<T, I, S>(&self, key: impl Into<String>, value: &T, ttl: Duration, tags: I)
    where
        T: Serialize + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(data) => {
                let tags = tags.into_iter().map(Into::into).collect();
                self.insert_value(key, data, ttl, tags);
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to serialize cache value, skipping"),
        }
    }

    /// Remove a key. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.store.lock().remove(key).is_some()
    }

    /// Remove every key indexed under any of `tags`. Returns the count removed.
    pub fn invalidate_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let mut store = self.store.lock();
        let keys: HashSet<String> = tags
            .iter()
            .filter_map(|tag| store.tag_index.get(tag.as_ref()))
            .flatten()
            .cloned()
            .collect();

        for key in &keys {
            store.remove(key);
        }

        if !keys.is_empty() {
            debug!(
                tags = ?tags.iter().map(AsRef::as_ref).collect::<Vec<_>>(),
                removed = keys.len(),
                "Invalidated cache entries by tag"
            );
        }
        keys.len()
    }

    /// Purge every expired entry. Returns the count removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.lock();
        let expired: Vec<String> = store
            .entries
            .iter()
            .filter(|(_, e)| !e.is_valid_at(now))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired {
            store.remove(key);
        }
        expired.len()
    }

    /// Drop every entry. Registered refreshers are kept.
    pub fn clear(&self) {
        let mut store = self.store.lock();
        store.entries.clear();
        store.tag_index.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// Concurrent callers for the same key are serialized: only the first
    /// runs `compute`, the rest observe its stored result. A failed
    /// computation stores nothing.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `compute`.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        tags: &[String],
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let _writer = self.lock_key(key).await;
        if let Some(hit) = self.get::<T>(key) {
            return Ok(hit);
        }
        let computed = compute().await;
        if let Ok(value) = &computed {
            self.set_tagged(key, value, ttl, tags.iter().cloned());
        }
        computed
    }

    /// Take the write lock for `key`, waiting for any current holder.
    ///
    /// Callers that compute a value and then store it under `key` hold the
    /// guard across both steps so one writer runs at a time per key.
    pub async fn lock_key(&self, key: &str) -> KeyGuard<'_> {
        let lock = self
            .key_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        KeyGuard {
            cache: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Register a function that periodically recomputes `key`.
    ///
    /// On refresh the entry's data is replaced while its TTL and tags are
    /// kept. A failed refresh leaves the existing entry in place.
    pub fn register_refresh<T, F, Fut>(&self, key: impl Into<String>, refresh: F)
    where
        T: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let f: RefreshFn = Arc::new(move || {
            let fut = refresh();
            async move {
                let value = fut.await?;
                Ok(serde_json::to_value(value)?)
            }
            .boxed()
        });
        self.refreshers.write().insert(key.into(), f);
    }

    /// Stop refreshing `key`. Returns whether a refresher was registered.
    pub fn unregister_refresh(&self, key: &str) -> bool {
        self.refreshers.write().remove(key).is_some()
    }

    /// Run every registered refresher once. Returns the count that succeeded.
    pub async fn refresh_all(&self) -> usize {
        let refreshers: Vec<(String, RefreshFn)> = self
            .refreshers
            .read()
            .iter()
            .map(|(k, f)| (k.clone(), Arc::clone(f)))
            .collect();

        let mut refreshed = 0;
        for (key, refresh) in refreshers {
            match refresh().await {
                Ok(data) => {
                    self.overwrite(&key, data);
                    refreshed += 1;
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Background refresh failed, keeping stale entry");
                }
            }
        }
        refreshed
    }

    /// Spawn the periodic sweep and refresh tasks.
    pub fn start(self: &Arc<Self>) -> CacheHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let cache = Arc::clone(self);
        let cleanup_every = self.config.cleanup_interval();
        let refresh_every = self.config.refresh_interval();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let mut cleanup = tokio::time::interval_at(start + cleanup_every, cleanup_every);
            let mut refresh = tokio::time::interval_at(start + refresh_every, refresh_every);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Cache background tasks shutting down");
                        break;
                    }

                    _ = cleanup.tick() => {
                        let removed = cache.cleanup_expired();
                        if removed > 0 {
                            debug!(removed, "Swept expired cache entries");
                        }
                    }

                    _ = refresh.tick() => {
                        let refreshed = cache.refresh_all().await;
                        debug!(refreshed, "Refreshed registered cache entries");
                    }
                }
            }
        });

        info!(
            cleanup_secs = cleanup_every.as_secs(),
            refresh_secs = refresh_every.as_secs(),
            "Cache background tasks started"
        );
        CacheHandle { shutdown_tx, task }
    }

    fn insert_value(&self, key: String, data: Value, ttl: Duration, tags: HashSet<String>) {
        let mut store = self.store.lock();
        store.insert(key, CacheEntry::new(data, ttl, tags));

        if store.entries.len() > self.config.max_memory_items {
            let evicted = Self::evict_least_recent(&mut store);
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(evicted, "Evicted least recently accessed cache entries");
        }
    }

    fn overwrite(&self, key: &str, data: Value) {
        let mut store = self.store.lock();
        let (ttl, tags) = store.entries.get(key).map_or_else(
            || (self.config.default_ttl(), HashSet::new()),
            |e| (e.ttl, e.tags.clone()),
        );
        store.insert(key.to_string(), CacheEntry::new(data, ttl, tags));
    }

    /// Evict the least recently accessed 10% (at least one) of entries.
    fn evict_least_recent(store: &mut Store) -> usize {
        let count = store.entries.len().div_ceil(10);
        let mut by_access: Vec<(String, Instant)> = store
            .entries
            .iter()
            .map(|(k, e)| (k.clone(), e.last_accessed))
            .collect();
        by_access.sort_by_key(|(_, at)| *at);

        for (key, _) in by_access.into_iter().take(count) {
            store.remove(&key);
        }
        count
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
