//! Background maintenance jobs.

#[cfg(feature = "scheduler")]
mod scheduler;

#[cfg(feature = "scheduler")]
pub use scheduler::{Scheduler, schedule_maintenance};

use crate::config::flag;

/// Every ten minutes, at second zero.
const DEFAULT_SWEEP_CRON: &str = "0 */10 * * * *";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Six-field cron expression (with seconds) for the maintenance sweep.
    pub sweep_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_cron: DEFAULT_SWEEP_CRON.to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: flag("SCHEDULER_ENABLED", defaults.enabled),
            sweep_cron: std::env::var("REVOCATION_SWEEP_CRON").unwrap_or(defaults.sweep_cron),
        }
    }
}
