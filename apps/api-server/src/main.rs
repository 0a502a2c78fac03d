//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);

    tracing::info!(
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;

    #[cfg(feature = "scheduler")]
    let mut scheduler = start_scheduler(&config, &state).await?;

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .configure(handlers::configure_app(state.clone()))
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await
    .context("server error")?;

    #[cfg(feature = "scheduler")]
    {
        if let Some(scheduler) = scheduler.as_mut() {
            scheduler.shutdown().await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(feature = "scheduler")]
async fn start_scheduler(
    config: &AppConfig,
    state: &AppState,
) -> anyhow::Result<Option<background::Scheduler>> {
    if !config.scheduler.enabled {
        tracing::info!("Scheduler disabled");
        return Ok(None);
    }

    let scheduler = background::Scheduler::new(config.scheduler.clone()).await?;
    background::schedule_maintenance(&scheduler, state).await?;
    scheduler.start().await?;

    Ok(Some(scheduler))
}
