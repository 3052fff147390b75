use care_api_rest::{AppState, router};
use care_core::config::{
    channel_from_env_value, data_dir_from_env_value, generation_interval_from_env_value,
    utc_offset_from_env_value,
};
use care_core::{
    CoreConfig, JsonFilePatientDirectory, JsonFileReminderStore, PatientDirectory, ReminderService,
    ReminderStore,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the care scheduling service
///
/// Starts the REST server and, unless disabled, a background task that runs daily reminder
/// generation on a fixed interval. Repeated runs only add what is new: doses keep one id per
/// dose and an appointment is reminded once per scheduled instant, so the interval can be much
/// shorter than a day.
///
/// # Environment Variables
/// - `CARE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CARE_DATA_DIR`: Directory holding `patients.json` and `reminders.json` (default: "care_data")
/// - `CARE_DEFAULT_CHANNEL`: `whatsapp` (default) or `sms`
/// - `CARE_UTC_OFFSET`: Local zone offset such as `+03:00` (default: UTC)
/// - `CARE_GENERATE_INTERVAL_SECS`: Seconds between generation runs (default: 3600, `0` disables)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("care_run=info".parse()?)
                .add_directive("care_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CARE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let interval =
        generation_interval_from_env_value(std::env::var("CARE_GENERATE_INTERVAL_SECS").ok())?;

    let cfg = Arc::new(CoreConfig::new(
        data_dir_from_env_value(std::env::var("CARE_DATA_DIR").ok()),
        channel_from_env_value(std::env::var("CARE_DEFAULT_CHANNEL").ok())?,
        utc_offset_from_env_value(std::env::var("CARE_UTC_OFFSET").ok())?,
    ));

    tracing::info!("++ Starting care REST on {}", rest_addr);
    tracing::info!("++ Data directory {}", cfg.data_dir().display());

    let service = ReminderService::new(Arc::clone(&cfg));
    let directory: Arc<dyn PatientDirectory> =
        Arc::new(JsonFilePatientDirectory::new(cfg.patients_path()));
    let store: Arc<dyn ReminderStore> = Arc::new(JsonFileReminderStore::new(cfg.reminders_path()));

    let generator = match interval {
        Some(every) => Some(tokio::spawn(generate_periodically(
            service.clone(),
            Arc::clone(&directory),
            Arc::clone(&store),
            every,
        ))),
        None => {
            tracing::info!("++ Background reminder generation disabled");
            None
        }
    };

    let app = router(AppState::new(service, directory, store));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let served = axum::serve(listener, app).await;

    if let Some(handle) = generator {
        handle.abort();
    }
    served?;

    Ok(())
}

/// Runs daily generation every `every`, sharing the REST server's store so that runs from both
/// are serialised by the same lock.
///
/// Failures are logged and retried on the next tick.
async fn generate_periodically(
    service: ReminderService,
    directory: Arc<dyn PatientDirectory>,
    store: Arc<dyn ReminderStore>,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;

        let service = service.clone();
        let directory = Arc::clone(&directory);
        let store = Arc::clone(&store);
        let run = tokio::task::spawn_blocking(move || {
            service.run_daily(directory.as_ref(), store.as_ref(), Utc::now())
        })
        .await;

        match run {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!("Scheduled reminder run failed: {e}"),
            Err(e) => tracing::error!("Scheduled reminder run panicked: {e}"),
        }
    }
}
