//! Configuration Module
//!
//! Handles cache construction options and the connection configuration
//! accepted by remote backends.

use std::env;

use serde::Deserialize;

use crate::error::{CacheError, Result};

// == Cache Config ==
/// Construction-time options recognized by every backend.
///
/// All values can be loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default TTL in seconds applied when `set` omits a TTL (None = entries
    /// without an explicit TTL never expire)
    pub default_ttl: Option<u64>,
    /// Maximum number of entries before LRU eviction kicks in (0 disables
    /// eviction; in-process backend only)
    pub max_size: usize,
    /// Whether hit/miss/eviction counters are recorded
    pub track_stats: bool,
    /// Background sweep interval in seconds (0 disables the sweep)
    pub sweep_interval: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: unset)
    /// - `CACHE_MAX_SIZE` - Maximum entries before eviction (default: 0, disabled)
    /// - `CACHE_TRACK_STATS` - Record statistics (default: true)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            default_ttl: env::var("CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok()),
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            track_stats: env::var("CACHE_TRACK_STATS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            sweep_interval: env::var("CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Sets the default TTL in seconds.
    pub fn with_default_ttl(mut self, ttl: u64) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Sets the maximum entry count before LRU eviction.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Enables or disables statistics recording.
    pub fn with_track_stats(mut self, track: bool) -> Self {
        self.track_stats = track;
        self
    }

    /// Sets the background sweep interval in seconds (0 disables the sweep).
    pub fn with_sweep_interval(mut self, seconds: u64) -> Self {
        self.sweep_interval = seconds;
        self
    }

    /// Checks the configuration for contract violations.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl == Some(0) {
            return Err(CacheError::Validation(
                "default_ttl must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: None,
            max_size: 0,
            track_stats: true,
            sweep_interval: 60,
        }
    }
}

// == Pool Config ==
/// Connection pool bounds for a remote backend.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Maximum open connections
    pub max_total: u32,
    /// Maximum idle connections kept around
    pub max_idle: u32,
    /// Idle connections maintained even when traffic is quiet
    pub min_idle: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total: 16,
            max_idle: 8,
            min_idle: 0,
        }
    }
}

// == Remote Config ==
/// Connection configuration accepted by a remote cache backend.
///
/// The remote adapter itself lives outside this crate; these are the
/// construction inputs it must accept. A backend built from this config is
/// expected to surface connectivity failures as [`CacheError::Connection`]
/// (or [`CacheError::PoolExhausted`]) so callers can distinguish them from
/// logical misses and retry.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Backend address, e.g. `redis://localhost:6379`
    pub address: String,
    /// Optional credential, passed through to the backend verbatim
    pub credential: Option<String>,
    /// Logical database index
    #[serde(default)]
    pub database: u32,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Connection pool bounds
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_connect_timeout() -> u64 {
    5
}

impl RemoteConfig {
    /// Creates a config for the given address with default pool bounds.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credential: None,
            database: 0,
            connect_timeout: default_connect_timeout(),
            pool: PoolConfig::default(),
        }
    }

    /// Checks the configuration for contract violations.
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(CacheError::Validation(
                "remote address must not be empty".to_string(),
            ));
        }
        if self.pool.max_total == 0 {
            return Err(CacheError::Validation(
                "pool.max_total must be positive".to_string(),
            ));
        }
        if self.pool.min_idle > self.pool.max_idle || self.pool.max_idle > self.pool.max_total {
            return Err(CacheError::Validation(
                "pool bounds must satisfy min_idle <= max_idle <= max_total".to_string(),
            ));
        }
        Ok(())
    }
}
