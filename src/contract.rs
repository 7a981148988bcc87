//! Cache Contract Module
//!
//! The backend-agnostic trait implemented by every cache backend. Callers
//! depend only on this contract; the in-process store, remote adapters, and
//! the namespace wrapper all satisfy it and are interchangeable behind
//! `Arc<dyn Cache>`.
//!
//! Misses and compare-and-swap mismatches are return values, never errors:
//! only contract violations (empty key, zero TTL) and backend connectivity
//! failures surface as `CacheError`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::cache::CacheStats;
use crate::error::{CacheError, Result};

// == Cache Trait ==
/// Uniform key-value cache operations across backends.
///
/// All operations are async and return [`Result`]. Same-key atomic
/// operations (`increment`, `decrement`, `set_if_absent`,
/// `compare_and_swap`) are linearizable with respect to each other;
/// operations on different keys carry no relative ordering guarantee.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Retrieves a value by key. Returns `Ok(None)` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a key-value pair, overwriting unconditionally.
    ///
    /// `ttl` is in seconds; `None` falls back to the configured default TTL
    /// (no expiration if none is configured). `Some(0)` is rejected.
    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<()>;

    /// Removes an entry. Returns true iff a live entry existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Returns true iff a live (non-expired) entry exists.
    ///
    /// Does not count as a read: neither statistics nor recency are updated.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remaining time-to-live in whole seconds (rounded up), or `None` if
    /// the key is absent or has no expiration.
    async fn ttl(&self, key: &str) -> Result<Option<u64>>;

    /// Updates the TTL of an existing key without changing its value.
    /// Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: u64) -> Result<bool>;

    /// Stores several key-value pairs with a shared TTL.
    async fn set_many(&self, entries: &HashMap<String, String>, ttl: Option<u64>) -> Result<()>;

    /// Retrieves several keys at once; absent keys are omitted from the map.
    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>>;

    /// Removes several keys, returning how many live entries were deleted.
    async fn delete_many(&self, keys: &[String]) -> Result<u64>;

    /// Atomically adds `delta` to the integer value at `key`, creating the
    /// key at `delta` if absent, and returns the new value.
    ///
    /// Concurrent increments on the same key are never lost. Fails with
    /// [`CacheError::NotAnInteger`] when the stored value does not parse as
    /// an integer or the addition would overflow.
    async fn increment(&self, key: &str, delta: i64) -> Result<i64>;

    /// Atomically subtracts `delta` from the integer value at `key`.
    /// Equivalent to `increment(key, -delta)`.
    async fn decrement(&self, key: &str, delta: i64) -> Result<i64> {
        let negated = delta
            .checked_neg()
            .ok_or_else(|| CacheError::NotAnInteger(key.to_string()))?;
        self.increment(key, negated).await
    }

    /// Stores the value only if the key is absent (the SETNX primitive).
    /// Returns true iff the key was absent and is now set.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<bool>;

    /// Atomically replaces the value iff the current value equals
    /// `expected`. Returns false, without error, on mismatch or absence.
    ///
    /// Equality is by value, matching the optimistic-locking pattern of
    /// re-reading and swapping on what was read.
    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> Result<bool>;

    /// Returns all live keys matching a glob pattern.
    ///
    /// `*` matches any run of characters, `?` exactly one character;
    /// matching is case-sensitive and anchored to the full key.
    async fn keys_matching(&self, pattern: &str) -> Result<HashSet<String>>;

    /// Counts live keys matching a glob pattern.
    async fn count_matching(&self, pattern: &str) -> Result<u64>;

    /// Deletes all live keys matching a glob pattern, returning the count.
    async fn delete_matching(&self, pattern: &str) -> Result<u64>;

    /// Deletes every key under a namespace, regardless of how many
    /// namespace views were layered to reach them.
    async fn clear_namespace(&self, prefix: &str) -> Result<u64> {
        validate_prefix(prefix)?;
        self.delete_matching(&format!("{prefix}:*")).await
    }

    /// Returns a snapshot of the instance-wide statistics.
    async fn cache_stats(&self) -> Result<CacheStats>;

    /// Resets all counters to zero and records the reset time.
    async fn clear_stats(&self) -> Result<()>;

    /// Releases backend resources (sweep task, connection pool). Idempotent.
    async fn close(&self) -> Result<()>;
}

// == Key Validation ==
/// Rejects keys every backend must refuse.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::Validation("key must not be empty".to_string()));
    }
    Ok(())
}

/// Rejects namespace prefixes every backend must refuse.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(CacheError::Validation(
            "namespace prefix must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Rejects TTL values every backend must refuse. `None` is always valid.
pub(crate) fn validate_ttl(ttl: Option<u64>) -> Result<()> {
    if ttl == Some(0) {
        return Err(CacheError::Validation("ttl must be positive".to_string()));
    }
    Ok(())
}
