use async_trait::async_trait;
use std::time::Duration;

/// Cache trait - abstraction over key/value backends (Redis, in-memory).
///
/// Backs the token invalidation set, so reads report backend failures
/// instead of treating them as misses.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a value from the cache.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value in the cache with optional TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Set a value only when no live entry holds the key. Returns whether
    /// this call wrote it. The check and the write are one atomic step.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Check if a live key exists.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
