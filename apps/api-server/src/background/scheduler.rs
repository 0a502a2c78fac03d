//! Cron-style job scheduler using tokio-cron-scheduler.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use super::SchedulerConfig;
use crate::state::AppState;

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Add a cron job.
    ///
    /// # Example
    /// ```ignore
    /// scheduler.add_cron("0 0 * * * *", || async {
    ///     tracing::info!("Running hourly job");
    /// }).await?;
    /// ```
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    /// Start the scheduler. A disabled scheduler never runs its jobs.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

/// Register the periodic sweeps: expired revocation entries (in-memory store
/// only; Redis expires keys itself) and idle rate limiter keys.
pub async fn schedule_maintenance(
    scheduler: &Scheduler,
    state: &AppState,
) -> Result<(), JobSchedulerError> {
    let cron = scheduler.config().sweep_cron.clone();

    if let Some(revocations) = state.revocations.clone() {
        scheduler
            .add_cron(&cron, move || {
                let revocations = revocations.clone();
                async move {
                    let purged = revocations.purge_expired().await;
                    tracing::debug!(purged, "Revocation sweep finished");
                }
            })
            .await?;
    }

    let limiter = state.rate_limiter.clone();
    scheduler
        .add_cron(&cron, move || {
            let limiter = limiter.clone();
            async move {
                limiter.retain_recent();
                tracing::debug!(tracked = limiter.tracked_keys(), "Rate limiter sweep finished");
            }
        })
        .await?;

    Ok(())
}
