//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//! This crate contains the credential and blog stores, token and password
//! services, the revocation cache and rate limiting.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory stores only
//! - `postgres` - PostgreSQL stores via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Per-client rate limiting via governor
//! - `redis` - Redis-backed revocation cache

pub mod cache;
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::{InMemoryBlogRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
pub use database::{DatabaseConnection, PostgresBlogRepository, PostgresUserRepository};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
