//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Mutation counter, starts at 1 and increments on every value change
    pub version: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_seconds` - Optional TTL in seconds
    pub fn new(value: String, ttl_seconds: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl_seconds.map(|ttl| now.saturating_add(ttl.saturating_mul(1000)));

        Self {
            value,
            version: 1,
            created_at: now,
            expires_at,
        }
    }

    // == Replace Value ==
    /// Replaces the stored value in place and bumps the version counter.
    ///
    /// The expiration timestamp is untouched; callers that want a fresh TTL
    /// reset it separately.
    pub fn replace_value(&mut self, value: String) {
        self.value = value;
        self.version += 1;
    }

    // == Set TTL ==
    /// Resets the expiration to `ttl_seconds` from now. Does not bump the
    /// version counter; the value is unchanged.
    pub fn set_ttl(&mut self, ttl_seconds: u64) {
        self.expires_at =
            Some(current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000)));
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: An entry is considered expired when the current time
    /// is greater than or equal to the expiration time. This ensures that once
    /// the TTL duration has fully elapsed, the entry is immediately expired.
    ///
    /// # Returns
    /// - `true` if the entry has a TTL and the current time >= expiration time
    /// - `false` if the entry has no TTL (never expires) or TTL hasn't elapsed
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            if expires > now {
                expires - now
            } else {
                0
            }
        })
    }

    /// Returns remaining TTL in whole seconds rounded up, or None if no
    /// expiration is set.
    ///
    /// Rounding up keeps the caller-visible invariant that a live entry set
    /// with `ttl = 1` reports a remaining TTL of 1, never 0.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_seconds)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.ttl_remaining_ms().map(|ms| (ms + 999) / 1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
