//! In-memory per-key rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use quill_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

type KeyedRateLimiter = GovernorRateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    DefaultClock,
    StateInformationMiddleware,
>;

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }
}

/// GCRA rate limiter keyed by client (IP address).
///
/// Limits are per-process, not shared between instances.
pub struct InMemoryRateLimiter {
    limiter: KeyedRateLimiter,
    clock: DefaultClock,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(config.max_requests)
            .ok_or_else(|| RateLimitError::Config("max_requests must be non-zero".to_string()))?;

        let quota = Quota::with_period(config.window / config.max_requests)
            .ok_or_else(|| RateLimitError::Config("window must be non-zero".to_string()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: GovernorRateLimiter::keyed(quota).with_middleware(),
            clock: DefaultClock::default(),
        })
    }

    /// Forget keys whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    /// Number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        let key = key.to_string();

        match self.limiter.check_key(&key) {
            Ok(snapshot) => Ok(RateLimitResult {
                allowed: true,
                remaining: snapshot.remaining_burst_capacity(),
                reset_after: Duration::ZERO,
            }),
            Err(not_until) => Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after: not_until.wait_time_from(self.clock.now()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_blocks_after_burst() {
        let limiter = limiter(2);

        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);

        let blocked = limiter.check("10.0.0.1").await.unwrap();
        assert!(!blocked.allowed);
        assert!(blocked.reset_after > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter(1);

        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.2").await.unwrap().allowed);
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_zero_requests_is_rejected() {
        let result = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 0,
            window: Duration::from_secs(60),
        });
        assert!(matches!(result, Err(RateLimitError::Config(_))));
    }
}
