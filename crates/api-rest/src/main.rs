//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful during development when only the HTTP surface is needed. The workspace's main
//! `care-run` binary also schedules the periodic daily generation run.

use care_api_rest::{router, AppState};
use care_core::config::{
    channel_from_env_value, data_dir_from_env_value, utc_offset_from_env_value,
};
use care_core::CoreConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the care REST API server.
///
/// # Environment Variables
/// - `CARE_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CARE_DATA_DIR`: Directory holding `patients.json` and `reminders.json`
/// - `CARE_DEFAULT_CHANNEL`: `whatsapp` (default) or `sms`
/// - `CARE_UTC_OFFSET`: Local zone offset such as `+03:00` (default: UTC)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("care_api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CARE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        data_dir_from_env_value(std::env::var("CARE_DATA_DIR").ok()),
        channel_from_env_value(std::env::var("CARE_DEFAULT_CHANNEL").ok())?,
        utc_offset_from_env_value(std::env::var("CARE_UTC_OFFSET").ok())?,
    ));

    tracing::info!(
        "-- Starting care REST API on {} (data dir {})",
        addr,
        cfg.data_dir().display()
    );

    let app = router(AppState::from_config(cfg));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
