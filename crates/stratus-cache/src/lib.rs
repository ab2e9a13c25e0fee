//! Stratus Cache - TTL-bounded remote listing cache
//!
//! SQLite-backed cache for remote folder listings and item metadata, used
//! by the reconciliation engine to avoid redundant remote calls. Entries
//! expire individually under a TTL; a process-wide cache epoch bounds
//! worst-case staleness by dropping the entire cache periodically.
//!
//! ## Key components
//!
//! - [`DatabasePool`] - connection pool with embedded schema migration
//! - [`ListingCache`] - check-then-fetch cache in front of a remote provider
//! - [`CacheError`] - error types for cache-store operations
//!
//! Cache-store failures are never fatal: reads degrade to a miss (the
//! provider is asked again) and writes are logged and dropped.

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::ListingCache;

/// Errors that can occur inside the cache store
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// A cached payload could not be decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}
