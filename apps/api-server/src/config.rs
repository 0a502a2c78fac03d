//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use quill_infra::database::DatabaseConfig;
use quill_infra::{JwtConfig, RateLimitConfig};

use crate::background::SchedulerConfig;
use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on the in-memory stores.
    pub database: Option<DatabaseConfig>,
    /// `None` keeps revoked token ids in process memory.
    pub redis_url: Option<String>,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub scheduler: SchedulerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parse_or("DB_MAX_CONNECTIONS", defaults.max_connections),
                min_connections: parse_or("DB_MIN_CONNECTIONS", defaults.min_connections),
                auto_migrate: flag("DATABASE_AUTO_MIGRATE", defaults.auto_migrate),
                ..defaults
            }
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            database,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            jwt: JwtConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
        }
    }
}

pub(crate) fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// `false`/`0` switch a flag off, any other value switches it on.
pub(crate) fn flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(default)
}
