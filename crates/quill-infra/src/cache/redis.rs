//! Redis cache - the invalidation set shared by every server instance.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use quill_core::ports::{Cache, CacheError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    pub connect_timeout: Duration,
    /// Prepended to every key so several deployments can share one server.
    pub namespace: String,
    /// Use the in-memory cache when Redis cannot be reached at startup.
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            namespace: "quill".to_string(),
            fallback_to_memory: true,
        }
    }
}

impl RedisConfig {
    /// Configuration for `url`, other settings from the environment.
    pub fn from_env_with_url(url: String) -> Self {
        let defaults = Self::default();
        Self {
            url,
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            namespace: std::env::var("REDIS_NAMESPACE").unwrap_or(defaults.namespace),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.fallback_to_memory),
        }
    }
}

/// Redis-backed cache.
///
/// The connection manager reconnects on its own; a failed command is reported
/// to the caller rather than treated as a miss.
pub struct RedisCache {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisCache {
    pub async fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, namespace = %config.namespace, "Connected to Redis cache");

        Ok(Self {
            conn,
            namespace: config.namespace,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

fn op_err(e: redis::RedisError) -> CacheError {
    CacheError::Operation(e.to_string())
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(self.key(key))
            .await
            .map_err(op_err)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.key(key);

        match ttl {
            // SETEX rejects a zero TTL.
            Some(duration) => conn
                .set_ex::<_, _, ()>(key, value, duration.as_secs().max(1))
                .await
                .map_err(op_err),
            None => conn.set::<_, _, ()>(key, value).await.map_err(op_err),
        }
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();

        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key(key)).arg(value).arg("NX");
        if let Some(duration) = ttl {
            cmd.arg("EX").arg(duration.as_secs().max(1));
        }

        // Nil reply when the key already exists.
        let reply: Option<String> = cmd.query_async(&mut conn).await.map_err(op_err)?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(key)).await.map_err(op_err)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(self.key(key)).await.map_err(op_err)
    }
}
