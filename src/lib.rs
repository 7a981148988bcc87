//! kvcache - A pluggable key-value cache
//!
//! One backend-agnostic contract ([`Cache`]) with TTL expiration, bounded
//! LRU eviction, atomic per-key operations, glob key enumeration, logical
//! namespacing, and hit/miss statistics.
//!
//! The in-process backend ([`MemoryCache`]) is fully implemented here; a
//! remote backend plugs in behind the same trait using the connection
//! configuration in [`config`].

pub mod cache;
pub mod config;
pub mod contract;
pub mod error;
pub mod namespace;

pub(crate) mod tasks;

pub use cache::{CacheStats, MemoryCache, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
pub use config::{CacheConfig, PoolConfig, RemoteConfig};
pub use contract::Cache;
pub use error::{CacheError, Result};
pub use namespace::NamespacedCache;
