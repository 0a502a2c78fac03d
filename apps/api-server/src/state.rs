//! Application state - shared across all handlers.

use std::sync::Arc;

use anyhow::Context;

use quill_core::ports::{BlogRepository, Cache, TokenService, UserRepository};
use quill_core::services::{AuthService, BlogService};
use quill_infra::{
    Argon2PasswordService, InMemoryBlogRepository, InMemoryCache, InMemoryRateLimiter,
    InMemoryUserRepository, JwtTokenService,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub blogs: Arc<BlogService>,
    pub rate_limiter: Arc<InMemoryRateLimiter>,
    /// Set when revoked token ids live in process memory and need sweeping.
    pub revocations: Option<Arc<InMemoryCache>>,
}

struct Stores {
    users: Arc<dyn UserRepository>,
    blogs: Arc<dyn BlogRepository>,
}

impl Stores {
    fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            blogs: Arc::new(InMemoryBlogRepository::new()),
        }
    }
}

impl AppState {
    /// Build the application state from configuration, connecting to the
    /// configured backends.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let stores = connect_stores(config).await?;
        let (revoked, revocations) = connect_revocation_store(config).await?;

        let passwords =
            Argon2PasswordService::from_env().context("invalid Argon2 parameters")?;

        Self::assemble(config, stores, revoked, revocations, passwords)
    }

    /// State over in-memory stores only.
    #[cfg(test)]
    pub fn in_memory(config: &AppConfig, passwords: Argon2PasswordService) -> anyhow::Result<Self> {
        let (revoked, revocations) = in_memory_revocations();
        Self::assemble(config, Stores::in_memory(), revoked, revocations, passwords)
    }

    fn assemble(
        config: &AppConfig,
        stores: Stores,
        revoked: Arc<dyn Cache>,
        revocations: Option<Arc<InMemoryCache>>,
        passwords: Argon2PasswordService,
    ) -> anyhow::Result<Self> {
        let tokens: Arc<dyn TokenService> =
            Arc::new(JwtTokenService::new(config.jwt.clone(), revoked));

        let rate_limiter = InMemoryRateLimiter::new(config.rate_limit.clone())
            .context("invalid rate limit configuration")?;

        let auth = AuthService::new(stores.users.clone(), tokens.clone(), Arc::new(passwords));
        let blogs = BlogService::new(stores.blogs, stores.users);

        tracing::info!("Application state initialized");

        Ok(Self {
            auth: Arc::new(auth),
            blogs: Arc::new(blogs),
            rate_limiter: Arc::new(rate_limiter),
            revocations,
        })
    }
}

#[cfg(feature = "postgres")]
async fn connect_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    use migration::MigratorTrait;
    use quill_infra::{PostgresBlogRepository, PostgresUserRepository, database};

    let Some(db_config) = config.database.as_ref() else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return Ok(Stores::in_memory());
    };

    let db = database::connect(db_config)
        .await
        .context("failed to connect to database")?;

    if db_config.auto_migrate {
        migration::Migrator::up(&db, None)
            .await
            .context("failed to apply migrations")?;
        tracing::info!("Migrations applied");
    }

    Ok(Stores {
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        blogs: Arc::new(PostgresBlogRepository::new(db)),
    })
}

#[cfg(not(feature = "postgres"))]
async fn connect_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    if config.database.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
    }
    tracing::info!("Using in-memory stores");
    Ok(Stores::in_memory())
}

type RevocationStore = (Arc<dyn Cache>, Option<Arc<InMemoryCache>>);

fn in_memory_revocations() -> RevocationStore {
    let cache = Arc::new(InMemoryCache::new());
    let revoked: Arc<dyn Cache> = cache.clone();
    (revoked, Some(cache))
}

#[cfg(feature = "redis")]
async fn connect_revocation_store(config: &AppConfig) -> anyhow::Result<RevocationStore> {
    use quill_infra::{RedisCache, RedisConfig};

    let Some(url) = config.redis_url.clone() else {
        return Ok(in_memory_revocations());
    };

    let redis_config = RedisConfig::from_env_with_url(url);
    let fallback = redis_config.fallback_to_memory;

    match RedisCache::new(redis_config).await {
        Ok(cache) => {
            let revoked: Arc<dyn Cache> = Arc::new(cache);
            Ok((revoked, None))
        }
        Err(e) if fallback => {
            tracing::error!(error = %e, "Redis unavailable, revocations are kept in memory");
            Ok(in_memory_revocations())
        }
        Err(e) => Err(e).context("failed to connect to Redis"),
    }
}

#[cfg(not(feature = "redis"))]
async fn connect_revocation_store(config: &AppConfig) -> anyhow::Result<RevocationStore> {
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL ignored: built without the redis feature");
    }
    Ok(in_memory_revocations())
}
