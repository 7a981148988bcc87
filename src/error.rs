//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.
//!
//! Ordinary cache misses and compare-and-swap mismatches are never errors;
//! they are represented as `None`/`false` return values. Errors are reserved
//! for contract violations and backend failures.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for all cache backends.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Malformed input: empty key or prefix, zero TTL, oversized key or
    /// value, invalid configuration
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Increment/decrement against a value that is not an integer, or
    /// arithmetic that would overflow
    #[error("Value at key '{0}' is not an integer or out of range")]
    NotAnInteger(String),

    /// Remote backend unreachable or the connection dropped mid-operation
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote backend connection pool exhausted
    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),
}

impl CacheError {
    /// True for transient backend failures that callers may retry after
    /// backing off. Validation and type errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::Connection(_) | CacheError::PoolExhausted(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
