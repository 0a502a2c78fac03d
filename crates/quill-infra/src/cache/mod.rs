//! Cache implementations - Redis and in-memory fallback.
//!
//! Used as the token invalidation set.

mod memory;

pub use memory::InMemoryCache;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, RedisConfig};
