//! Namespace View Module
//!
//! A thin key-prefixing wrapper implementing the full cache contract over
//! any underlying backend. Owns no storage: every key is transformed to
//! `prefix:key` on the way in, and the prefix is stripped from enumerated
//! keys on the way out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CacheStats;
use crate::contract::{validate_key, validate_prefix, Cache};
use crate::error::Result;

// == Namespaced Cache ==
/// A view of an inner cache scoped to a key prefix.
///
/// Views compose: `with_namespace` on a view produces `outer:inner:key`
/// addressing, and `clear_namespace` on the underlying cache removes keys
/// under a prefix no matter how many views were layered to write them.
#[derive(Clone)]
pub struct NamespacedCache {
    inner: Arc<dyn Cache>,
    prefix: String,
}

impl std::fmt::Debug for NamespacedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedCache")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl NamespacedCache {
    // == Constructor ==
    /// Creates a view of `inner` scoped to `prefix`.
    pub fn new(inner: Arc<dyn Cache>, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { inner, prefix })
    }

    // == Nesting ==
    /// Returns a view nested one level deeper, composing the prefixes.
    pub fn with_namespace(&self, prefix: impl Into<String>) -> Result<NamespacedCache> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            inner: Arc::clone(&self.inner),
            prefix: format!("{}:{}", self.prefix, prefix),
        })
    }

    /// The prefix this view applies, without the trailing separator.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn scoped(&self, key: &str) -> Result<String> {
        validate_key(key)?;
        Ok(format!("{}:{}", self.prefix, key))
    }

    fn scoped_pattern(&self, pattern: &str) -> String {
        format!("{}:{}", self.prefix, pattern)
    }

    fn strip(&self, key: &str) -> Option<String> {
        key.strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(str::to_string)
    }
}

#[async_trait]
impl Cache for NamespacedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(&self.scoped(key)?).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<()> {
        self.inner.set(&self.scoped(key)?, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(&self.scoped(key)?).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(&self.scoped(key)?).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        self.inner.ttl(&self.scoped(key)?).await
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        self.inner.expire(&self.scoped(key)?, ttl).await
    }

    async fn set_many(&self, entries: &HashMap<String, String>, ttl: Option<u64>) -> Result<()> {
        let mut scoped = HashMap::with_capacity(entries.len());
        for (key, value) in entries {
            scoped.insert(self.scoped(key)?, value.clone());
        }
        self.inner.set_many(&scoped, ttl).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        let mut scoped = Vec::with_capacity(keys.len());
        for key in keys {
            scoped.push(self.scoped(key)?);
        }

        let found = self.inner.get_many(&scoped).await?;
        Ok(found
            .into_iter()
            .filter_map(|(key, value)| self.strip(&key).map(|bare| (bare, value)))
            .collect())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        let mut scoped = Vec::with_capacity(keys.len());
        for key in keys {
            scoped.push(self.scoped(key)?);
        }
        self.inner.delete_many(&scoped).await
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        self.inner.increment(&self.scoped(key)?, delta).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<bool> {
        self.inner.set_if_absent(&self.scoped(key)?, value, ttl).await
    }

    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> Result<bool> {
        self.inner
            .compare_and_swap(&self.scoped(key)?, expected, new)
            .await
    }

    async fn keys_matching(&self, pattern: &str) -> Result<HashSet<String>> {
        let found = self.inner.keys_matching(&self.scoped_pattern(pattern)).await?;
        Ok(found.iter().filter_map(|key| self.strip(key)).collect())
    }

    async fn count_matching(&self, pattern: &str) -> Result<u64> {
        self.inner.count_matching(&self.scoped_pattern(pattern)).await
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64> {
        self.inner.delete_matching(&self.scoped_pattern(pattern)).await
    }

    async fn cache_stats(&self) -> Result<CacheStats> {
        self.inner.cache_stats().await
    }

    async fn clear_stats(&self) -> Result<()> {
        self.inner.clear_stats().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
