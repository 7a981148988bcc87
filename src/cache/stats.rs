//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.
//!
//! Counters live in a `StatsRecorder` of atomics so concurrent readers and
//! writers update them without taking the store lock; `CacheStats` is the
//! read-only snapshot handed to callers.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Read-only snapshot of cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Current number of live (non-expired) entries
    pub size: usize,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// When the counters were last reset, if ever
    pub last_reset_at: Option<DateTime<Utc>>,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Mutable counter state shared by a cache instance.
///
/// When recording is disabled the record methods no-op; snapshots still
/// report an accurate size, which comes from the store, not from here.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    /// Unix milliseconds of the last reset; 0 = never reset
    last_reset_ms: AtomicI64,
}

impl StatsRecorder {
    // == Constructor ==
    /// Creates a recorder with all counters at zero.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        if self.enabled {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        if self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&self) {
        if self.enabled {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    // == Reset ==
    /// Zeroes all counters and records the reset time.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.last_reset_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Captures the current counters alongside the store's live entry count.
    pub fn snapshot(&self, size: usize) -> CacheStats {
        let reset_ms = self.last_reset_ms.load(Ordering::Relaxed);
        let last_reset_at = if reset_ms == 0 {
            None
        } else {
            Utc.timestamp_millis_opt(reset_ms).single()
        };

        CacheStats {
            size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            last_reset_at,
        }
    }
}
