//! Cache Store Module
//!
//! In-process cache backend combining HashMap storage with LRU tracking and
//! TTL expiration. `MemoryCache` is a cheap-to-clone handle; all clones share
//! the same store, statistics, and sweep task.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::pattern::glob_match;
use crate::cache::{
    CacheEntry, CacheStats, LruTracker, StatsRecorder, MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
use crate::config::CacheConfig;
use crate::contract::{validate_key, validate_ttl, Cache};
use crate::error::{CacheError, Result};
use crate::namespace::NamespacedCache;
use crate::tasks::{purge_expired, spawn_sweep_task};

// == Store Inner ==
/// Entry map plus recency tracking, always mutated together under one lock.
#[derive(Debug)]
pub(crate) struct StoreInner {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    max_size: usize,
}

impl StoreInner {
    fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_size,
        }
    }

    /// The single removal path: delete, lazy expiry, eviction, and the sweep
    /// all funnel through here so the map and the recency list never drift.
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.lru.remove(key);
        }
        removed
    }

    /// Drops the entry at `key` if it has expired. Returns true if an entry
    /// was purged.
    pub(crate) fn purge_if_expired(&mut self, key: &str) -> bool {
        let expired = self.entries.get(key).is_some_and(|e| e.is_expired());
        if expired {
            self.remove(key);
        }
        expired
    }

    /// Keys whose entries have passed their expiration.
    pub(crate) fn expired_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Inserts an entry, evicting from the LRU end first when a bound is
    /// configured and the store is full. An evicted entry that had already
    /// expired counts as a purge, not an eviction.
    fn insert(&mut self, key: String, entry: CacheEntry, stats: &StatsRecorder) {
        let is_new = !self.entries.contains_key(&key);
        if is_new && self.max_size > 0 {
            while self.entries.len() >= self.max_size {
                let Some(victim) = self.lru.evict_oldest() else {
                    break;
                };
                if let Some(old) = self.entries.remove(&victim) {
                    if !old.is_expired() {
                        stats.record_eviction();
                        debug!(key = %victim, "Evicted least recently used entry");
                    }
                }
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, entry);
    }

    /// Number of live (non-expired) entries.
    fn live_len(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }
}

// == Memory Cache ==
/// In-process cache with LRU eviction, TTL expiration, and a background
/// sweep for unread expired entries.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<RwLock<StoreInner>>,
    stats: Arc<StatsRecorder>,
    default_ttl: Option<u64>,
    shutdown: watch::Sender<bool>,
    sweep: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates a new MemoryCache from the given configuration.
    ///
    /// Spawns the background sweep task unless `sweep_interval` is 0, so
    /// construction with a sweep must happen inside a tokio runtime.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let inner = Arc::new(RwLock::new(StoreInner::new(config.max_size)));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let sweep = if config.sweep_interval > 0 {
            Some(spawn_sweep_task(
                Arc::downgrade(&inner),
                Duration::from_secs(config.sweep_interval),
                shutdown_rx,
            ))
        } else {
            None
        };

        info!(
            max_size = config.max_size,
            default_ttl = ?config.default_ttl,
            sweep_interval = config.sweep_interval,
            "In-process cache initialized"
        );

        Ok(Self {
            inner,
            stats: Arc::new(StatsRecorder::new(config.track_stats)),
            default_ttl: config.default_ttl,
            shutdown,
            sweep: Arc::new(Mutex::new(sweep)),
        })
    }

    // == Namespace View ==
    /// Returns a view of this cache scoped to `prefix`.
    pub fn with_namespace(&self, prefix: impl Into<String>) -> Result<NamespacedCache> {
        NamespacedCache::new(Arc::new(self.clone()), prefix)
    }

    // == Purge Expired ==
    /// Removes all expired entries immediately, returning how many were
    /// purged. The background sweep runs this same pass on its interval.
    pub async fn purge_expired(&self) -> usize {
        purge_expired(&self.inner).await
    }

    // == Validation ==
    fn validate_entry(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::Validation(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::Validation(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }
        Ok(())
    }

    /// Builds the entry for an unconditional `set`, carrying the version
    /// forward from any live predecessor.
    fn make_entry(prior_version: u64, value: &str, ttl: Option<u64>) -> CacheEntry {
        let mut entry = CacheEntry::new(value.to_string(), ttl);
        entry.version = prior_version + 1;
        entry
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        let mut inner = self.inner.write().await;
        inner.purge_if_expired(key);

        if let Some(entry) = inner.entries.get(key) {
            let value = entry.value.clone();
            inner.lru.touch(key);
            self.stats.record_hit();
            debug!(key, "Cache HIT");
            return Ok(Some(value));
        }

        self.stats.record_miss();
        debug!(key, "Cache MISS");
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<()> {
        self.validate_entry(key, value)?;
        validate_ttl(ttl)?;
        let effective_ttl = ttl.or(self.default_ttl);

        let mut inner = self.inner.write().await;
        inner.purge_if_expired(key);
        let prior_version = inner.entries.get(key).map(|e| e.version).unwrap_or(0);
        let entry = Self::make_entry(prior_version, value, effective_ttl);
        inner.insert(key.to_string(), entry, &self.stats);

        debug!(key, ttl = ?effective_ttl, "Cache SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let mut inner = self.inner.write().await;
        inner.purge_if_expired(key);
        let removed = inner.remove(key).is_some();
        if removed {
            debug!(key, "Cache DEL");
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let inner = self.inner.read().await;
        Ok(inner.entries.get(key).is_some_and(|e| !e.is_expired()))
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        validate_key(key)?;

        let inner = self.inner.read().await;
        match inner.entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(entry.ttl_remaining()),
            _ => Ok(None),
        }
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        validate_key(key)?;
        validate_ttl(Some(ttl))?;

        let mut inner = self.inner.write().await;
        inner.purge_if_expired(key);
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.set_ttl(ttl);
            debug!(key, ttl, "Cache EXPIRE");
            return Ok(true);
        }
        Ok(false)
    }

    async fn set_many(&self, entries: &HashMap<String, String>, ttl: Option<u64>) -> Result<()> {
        for (key, value) in entries {
            self.validate_entry(key, value)?;
        }
        validate_ttl(ttl)?;
        let effective_ttl = ttl.or(self.default_ttl);

        let mut inner = self.inner.write().await;
        for (key, value) in entries {
            inner.purge_if_expired(key);
            let prior_version = inner.entries.get(key).map(|e| e.version).unwrap_or(0);
            let entry = Self::make_entry(prior_version, value, effective_ttl);
            inner.insert(key.clone(), entry, &self.stats);
        }

        debug!(count = entries.len(), "Cache MSET");
        Ok(())
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        for key in keys {
            validate_key(key)?;
        }

        let mut inner = self.inner.write().await;
        let mut found = HashMap::new();
        for key in keys {
            inner.purge_if_expired(key);
            if let Some(entry) = inner.entries.get(key.as_str()) {
                found.insert(key.clone(), entry.value.clone());
                inner.lru.touch(key);
                self.stats.record_hit();
            } else {
                self.stats.record_miss();
            }
        }

        debug!(requested = keys.len(), found = found.len(), "Cache MGET");
        Ok(found)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        for key in keys {
            validate_key(key)?;
        }

        let mut inner = self.inner.write().await;
        let mut removed = 0;
        for key in keys {
            inner.purge_if_expired(key);
            if inner.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        validate_key(key)?;

        // The whole read-modify-write happens under the write lock, so
        // concurrent increments on one key serialize without lost updates.
        let mut inner = self.inner.write().await;
        inner.purge_if_expired(key);

        if let Some(entry) = inner.entries.get_mut(key) {
            let current: i64 = entry
                .value
                .parse()
                .map_err(|_| CacheError::NotAnInteger(key.to_string()))?;
            let next = current
                .checked_add(delta)
                .ok_or_else(|| CacheError::NotAnInteger(key.to_string()))?;
            entry.replace_value(next.to_string());
            inner.lru.touch(key);
            return Ok(next);
        }

        // Absent key: the counter starts at delta, with no expiration
        let entry = CacheEntry::new(delta.to_string(), None);
        inner.insert(key.to_string(), entry, &self.stats);
        Ok(delta)
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<bool> {
        self.validate_entry(key, value)?;
        validate_ttl(ttl)?;
        let effective_ttl = ttl.or(self.default_ttl);

        let mut inner = self.inner.write().await;
        inner.purge_if_expired(key);
        if inner.entries.contains_key(key) {
            return Ok(false);
        }

        let entry = CacheEntry::new(value.to_string(), effective_ttl);
        inner.insert(key.to_string(), entry, &self.stats);
        debug!(key, "Cache SETNX");
        Ok(true)
    }

    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> Result<bool> {
        self.validate_entry(key, new)?;

        let mut inner = self.inner.write().await;
        inner.purge_if_expired(key);

        if let Some(entry) = inner.entries.get_mut(key) {
            if entry.value == expected {
                // Swap in place: expiry carries over, version bumps
                entry.replace_value(new.to_string());
                inner.lru.touch(key);
                debug!(key, "Cache CAS swapped");
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<HashSet<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn count_matching(&self, pattern: &str) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && glob_match(pattern, key))
            .count() as u64)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let victims: Vec<String> = inner
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = 0;
        for key in &victims {
            if inner.remove(key).is_some() {
                removed += 1;
            }
        }

        debug!(pattern, removed, "Cache pattern DEL");
        Ok(removed)
    }

    async fn cache_stats(&self) -> Result<CacheStats> {
        let inner = self.inner.read().await;
        Ok(self.stats.snapshot(inner.live_len()))
    }

    async fn clear_stats(&self) -> Result<()> {
        self.stats.reset();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // Signal the sweep to stop before its next iteration, then wait
        let _ = self.shutdown.send(true);
        let handle = self.sweep.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "TTL sweep task ended abnormally");
            }
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_cache() -> MemoryCache {
        MemoryCache::new(CacheConfig::default().with_sweep_interval(0)).unwrap()
    }

    fn bounded_cache(max_size: usize) -> MemoryCache {
        MemoryCache::new(
            CacheConfig::default()
                .with_max_size(max_size)
                .with_sweep_interval(0),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let cache = test_cache();

        cache.set("key1", "value1", None).await.unwrap();
        let value = cache.get("key1").await.unwrap();

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(cache.cache_stats().await.unwrap().size, 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let cache = test_cache();
        assert_eq!(cache.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_empty_key_rejected() {
        let cache = test_cache();

        assert!(matches!(
            cache.get("").await,
            Err(CacheError::Validation(_))
        ));
        assert!(matches!(
            cache.set("", "value", None).await,
            Err(CacheError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_store_zero_ttl_rejected() {
        let cache = test_cache();
        assert!(matches!(
            cache.set("key", "value", Some(0)).await,
            Err(CacheError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_store_delete() {
        let cache = test_cache();

        cache.set("key1", "value1", None).await.unwrap();
        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());
        assert_eq!(cache.get("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_overwrite_bumps_version() {
        let cache = test_cache();

        cache.set("key1", "value1", None).await.unwrap();
        cache.set("key1", "value2", None).await.unwrap();

        assert_eq!(cache.get("key1").await.unwrap().as_deref(), Some("value2"));

        let inner = cache.inner.read().await;
        assert_eq!(inner.entries.get("key1").map(|e| e.version), Some(2));
    }

    #[tokio::test]
    async fn test_store_default_ttl_applied() {
        let cache = MemoryCache::new(
            CacheConfig::default()
                .with_default_ttl(30)
                .with_sweep_interval(0),
        )
        .unwrap();

        cache.set("key1", "value1", None).await.unwrap();
        let remaining = cache.ttl("key1").await.unwrap().unwrap();
        assert!(remaining > 0 && remaining <= 30);
    }

    #[tokio::test]
    async fn test_store_ttl_expiration() {
        let cache = test_cache();

        cache.set("key1", "value1", Some(1)).await.unwrap();
        assert!(cache.exists("key1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        // Expired entry is treated as absent before it is physically purged
        assert!(!cache.exists("key1").await.unwrap());
        assert_eq!(cache.get("key1").await.unwrap(), None);
        assert_eq!(cache.ttl("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_expire_updates_ttl_only() {
        let cache = test_cache();

        cache.set("key1", "value1", None).await.unwrap();
        assert_eq!(cache.ttl("key1").await.unwrap(), None);

        assert!(cache.expire("key1", 100).await.unwrap());
        let remaining = cache.ttl("key1").await.unwrap().unwrap();
        assert!(remaining > 0 && remaining <= 100);
        assert_eq!(cache.get("key1").await.unwrap().as_deref(), Some("value1"));

        // Version unchanged by a TTL-only update
        let inner = cache.inner.read().await;
        assert_eq!(inner.entries.get("key1").map(|e| e.version), Some(1));
    }

    #[tokio::test]
    async fn test_store_expire_absent_key() {
        let cache = test_cache();
        assert!(!cache.expire("ghost", 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_lru_eviction() {
        let cache = bounded_cache(3);

        cache.set("key1", "value1", None).await.unwrap();
        cache.set("key2", "value2", None).await.unwrap();
        cache.set("key3", "value3", None).await.unwrap();

        // Cache is full, adding key4 should evict key1 (oldest)
        cache.set("key4", "value4", None).await.unwrap();

        let stats = cache.cache_stats().await.unwrap();
        assert_eq!(stats.size, 3);
        assert_eq!(stats.evictions, 1);
        assert_eq!(cache.get("key1").await.unwrap(), None);
        assert!(cache.get("key2").await.unwrap().is_some());
        assert!(cache.get("key3").await.unwrap().is_some());
        assert!(cache.get("key4").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_lru_touch_on_get() {
        let cache = bounded_cache(3);

        cache.set("key1", "value1", None).await.unwrap();
        cache.set("key2", "value2", None).await.unwrap();
        cache.set("key3", "value3", None).await.unwrap();

        // Access key1 to make it most recently used
        cache.get("key1").await.unwrap();

        // Adding key4 should evict key2 (now oldest)
        cache.set("key4", "value4", None).await.unwrap();

        assert!(cache.get("key1").await.unwrap().is_some());
        assert_eq!(cache.get("key2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_overwrite_does_not_evict() {
        let cache = bounded_cache(2);

        cache.set("key1", "value1", None).await.unwrap();
        cache.set("key2", "value2", None).await.unwrap();
        cache.set("key1", "updated", None).await.unwrap();

        let stats = cache.cache_stats().await.unwrap();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.evictions, 0);
    }

    #[tokio::test]
    async fn test_store_unbounded_never_evicts() {
        let cache = test_cache();

        for i in 0..500 {
            cache.set(&format!("key{i}"), "value", None).await.unwrap();
        }

        let stats = cache.cache_stats().await.unwrap();
        assert_eq!(stats.size, 500);
        assert_eq!(stats.evictions, 0);
    }

    #[tokio::test]
    async fn test_store_stats() {
        let cache = test_cache();

        cache.set("key1", "value1", None).await.unwrap();
        cache.get("key1").await.unwrap(); // hit
        cache.get("nonexistent").await.unwrap(); // miss

        let stats = cache.cache_stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn test_store_clear_stats() {
        let cache = test_cache();

        cache.get("missing").await.unwrap();
        cache.clear_stats().await.unwrap();

        let stats = cache.cache_stats().await.unwrap();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert!(stats.last_reset_at.is_some());
    }

    #[tokio::test]
    async fn test_store_purge_expired() {
        let cache = test_cache();

        cache.set("key1", "value1", Some(1)).await.unwrap();
        cache.set("key2", "value2", Some(10)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let removed = cache.purge_expired().await;
        assert_eq!(removed, 1);
        assert!(cache.get("key2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_key_too_long() {
        let cache = test_cache();
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = cache.set(&long_key, "value", None).await;
        assert!(matches!(result, Err(CacheError::Validation(_))));
    }

    #[tokio::test]
    async fn test_store_value_too_large() {
        let cache = test_cache();
        let large_value = "x".repeat(MAX_VALUE_SIZE + 1);

        let result = cache.set("key", &large_value, None).await;
        assert!(matches!(result, Err(CacheError::Validation(_))));
    }

    #[tokio::test]
    async fn test_increment_creates_at_delta() {
        let cache = test_cache();

        assert_eq!(cache.increment("counter", 1).await.unwrap(), 1);
        assert_eq!(cache.increment("counter", 1).await.unwrap(), 2);
        assert_eq!(cache.increment("counter", 5).await.unwrap(), 7);
        assert_eq!(cache.get("counter").await.unwrap().as_deref(), Some("7"));

        // Counters created by increment carry no expiration
        assert_eq!(cache.ttl("counter").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_preserves_ttl() {
        let cache = test_cache();

        cache.set("counter", "10", Some(100)).await.unwrap();
        assert_eq!(cache.increment("counter", 1).await.unwrap(), 11);

        let remaining = cache.ttl("counter").await.unwrap().unwrap();
        assert!(remaining > 0 && remaining <= 100);
    }

    #[tokio::test]
    async fn test_decrement() {
        let cache = test_cache();

        cache.set("counter", "10", None).await.unwrap();
        assert_eq!(cache.decrement("counter", 3).await.unwrap(), 7);

        // Decrementing an absent key creates it at the negated delta
        assert_eq!(cache.decrement("fresh", 2).await.unwrap(), -2);
    }

    #[tokio::test]
    async fn test_increment_non_integer_value() {
        let cache = test_cache();

        cache.set("name", "alice", None).await.unwrap();
        let result = cache.increment("name", 1).await;
        assert!(matches!(result, Err(CacheError::NotAnInteger(_))));

        // The stored value is untouched by the failed increment
        assert_eq!(cache.get("name").await.unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_increment_overflow() {
        let cache = test_cache();

        cache.set("counter", &i64::MAX.to_string(), None).await.unwrap();
        let result = cache.increment("counter", 1).await;
        assert!(matches!(result, Err(CacheError::NotAnInteger(_))));
    }

    #[tokio::test]
    async fn test_increment_bumps_version() {
        let cache = test_cache();

        cache.set("counter", "0", None).await.unwrap();
        cache.increment("counter", 1).await.unwrap();
        cache.increment("counter", 1).await.unwrap();

        let inner = cache.inner.read().await;
        assert_eq!(inner.entries.get("counter").map(|e| e.version), Some(3));
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let cache = test_cache();

        assert!(cache.set_if_absent("lock", "owner-a", None).await.unwrap());
        assert!(!cache.set_if_absent("lock", "owner-b", None).await.unwrap());
        assert_eq!(cache.get("lock").await.unwrap().as_deref(), Some("owner-a"));
    }

    #[tokio::test]
    async fn test_set_if_absent_after_expiry() {
        let cache = test_cache();

        cache.set_if_absent("lock", "owner-a", Some(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        // The expired holder no longer blocks the lock
        assert!(cache.set_if_absent("lock", "owner-b", None).await.unwrap());
        assert_eq!(cache.get("lock").await.unwrap().as_deref(), Some("owner-b"));
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let cache = test_cache();

        cache.set("key", "a", None).await.unwrap();
        assert!(cache.compare_and_swap("key", "a", "b").await.unwrap());
        assert_eq!(cache.get("key").await.unwrap().as_deref(), Some("b"));

        assert!(!cache.compare_and_swap("key", "a", "c").await.unwrap());
        assert_eq!(cache.get("key").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_compare_and_swap_absent_key() {
        let cache = test_cache();
        assert!(!cache.compare_and_swap("ghost", "a", "b").await.unwrap());
        assert_eq!(cache.get("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_compare_and_swap_preserves_ttl() {
        let cache = test_cache();

        cache.set("key", "a", Some(100)).await.unwrap();
        assert!(cache.compare_and_swap("key", "a", "b").await.unwrap());

        let remaining = cache.ttl("key").await.unwrap().unwrap();
        assert!(remaining > 0 && remaining <= 100);
    }

    #[tokio::test]
    async fn test_keys_matching() {
        let cache = test_cache();

        cache.set("user:1", "a", None).await.unwrap();
        cache.set("user:2", "b", None).await.unwrap();
        cache.set("session:a", "c", None).await.unwrap();

        let keys = cache.keys_matching("user:*").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("user:1"));
        assert!(keys.contains("user:2"));

        assert_eq!(cache.count_matching("user:*").await.unwrap(), 2);
        assert_eq!(cache.count_matching("*").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_keys_matching_skips_expired() {
        let cache = test_cache();

        cache.set("user:1", "a", Some(1)).await.unwrap();
        cache.set("user:2", "b", None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let keys = cache.keys_matching("user:*").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("user:2"));
    }

    #[tokio::test]
    async fn test_delete_matching() {
        let cache = test_cache();

        cache.set("user:1", "a", None).await.unwrap();
        cache.set("user:2", "b", None).await.unwrap();
        cache.set("session:a", "c", None).await.unwrap();

        let removed = cache.delete_matching("user:*").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get("user:1").await.unwrap(), None);
        assert!(cache.get("session:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_batch_operations() {
        let cache = test_cache();

        let mut entries = HashMap::new();
        entries.insert("a".to_string(), "1".to_string());
        entries.insert("b".to_string(), "2".to_string());
        cache.set_many(&entries, None).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let found = cache.get_many(&keys).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.get("a").map(String::as_str), Some("1"));
        assert!(!found.contains_key("c"));

        let removed = cache.delete_many(&keys).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.cache_stats().await.unwrap().size, 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let cache = MemoryCache::new(CacheConfig::default().with_sweep_interval(1)).unwrap();

        cache.close().await.unwrap();
        cache.close().await.unwrap();

        // The store remains usable after close; only the sweep is gone
        cache.set("key", "value", None).await.unwrap();
        assert!(cache.get("key").await.unwrap().is_some());
    }
}
