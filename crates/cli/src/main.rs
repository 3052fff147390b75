use anyhow::Context;
use care_core::config::{
    channel_from_env_value, data_dir_from_env_value, utc_offset_from_env_value,
};
use care_core::{
    ConditionType, CoreConfig, DiagnosisContext, JsonFilePatientDirectory, JsonFileReminderStore,
    NonEmptyText, Reminder, ReminderId, ReminderService, Severity, VisitType,
};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "care")]
#[command(about = "Care scheduling CLI: follow-up suggestions and daily reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest the next appointment for a diagnosis
    Suggest {
        /// mild, moderate, severe or critical (omit if not recorded)
        #[arg(long)]
        severity: Option<Severity>,
        /// pregnancy, diabetes, hypertension, tuberculosis, other or none
        #[arg(long, default_value = "none")]
        condition: ConditionType,
        /// outpatient, inpatient, emergency or followup
        #[arg(long)]
        visit: VisitType,
        /// Diagnosis name used in the rationale
        #[arg(long)]
        diagnosis: Option<String>,
        /// Reference date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate today's reminders from patients.json into reminders.json
    Generate {
        /// Reference time (RFC 3339), now if omitted
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// List unsent reminders that are due
    Due {
        /// Reference time (RFC 3339), now if omitted
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Mark a reminder as sent
    MarkSent {
        /// Reminder id (32 lowercase hex characters)
        id: String,
        /// Delivery time (RFC 3339), now if omitted
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("care=info".parse()?)
                .add_directive("care_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = Arc::new(config_from_env()?);
    tracing::debug!("Using data directory {}", cfg.data_dir().display());
    let service = ReminderService::new(Arc::clone(&cfg));

    match cli.command {
        Commands::Suggest {
            severity,
            condition,
            visit,
            diagnosis,
            date,
        } => {
            let diagnosis_name = diagnosis
                .filter(|d| !d.trim().is_empty())
                .map(NonEmptyText::new)
                .transpose()?;
            let ctx = DiagnosisContext {
                severity,
                condition_type: condition,
                visit_type: visit,
                diagnosis_name,
            };
            let now = date
                .map(|d| d.and_time(NaiveTime::MIN).and_utc())
                .unwrap_or_else(Utc::now);

            let suggestion = service.suggest(&ctx, now);
            println!(
                "Next appointment: {} (in {} days)",
                suggestion.suggested_date, suggestion.days_from_now
            );
            println!("{}", suggestion.rationale);
        }
        Commands::Generate { now } => {
            let directory = JsonFilePatientDirectory::new(cfg.patients_path());
            let store = JsonFileReminderStore::new(cfg.reminders_path());
            let summary = service
                .run_daily(&directory, &store, now.unwrap_or_else(Utc::now))
                .context("daily reminder run failed")?;
            tracing::info!(
                day = %summary.day,
                inserted = summary.inserted,
                "-- Reminders written to {}",
                cfg.reminders_path().display()
            );

            println!(
                "{}: {} patients, {} new reminders, {} stored",
                summary.day, summary.patients, summary.candidates_new, summary.inserted
            );
            for reminder in &summary.reminders {
                print_reminder(reminder);
            }
        }
        Commands::Due { now } => {
            let store = JsonFileReminderStore::new(cfg.reminders_path());
            let due = service.due(&store, now.unwrap_or_else(Utc::now))?;
            if due.is_empty() {
                println!("No reminders due.");
            }
            for reminder in &due {
                print_reminder(reminder);
            }
        }
        Commands::MarkSent { id, at } => {
            let id = ReminderId::parse(&id)?;
            let store = JsonFileReminderStore::new(cfg.reminders_path());
            service.mark_sent(&store, id, at.unwrap_or_else(Utc::now))?;
            println!("Marked reminder {id} as sent");
        }
    }

    Ok(())
}

fn config_from_env() -> anyhow::Result<CoreConfig> {
    Ok(CoreConfig::new(
        data_dir_from_env_value(std::env::var("CARE_DATA_DIR").ok()),
        channel_from_env_value(std::env::var("CARE_DEFAULT_CHANNEL").ok())?,
        utc_offset_from_env_value(std::env::var("CARE_UTC_OFFSET").ok())?,
    ))
}

fn print_reminder(reminder: &Reminder) {
    println!(
        "{}  {}  {:<11} {:<8} {}  {}",
        reminder.id,
        reminder
            .scheduled_for
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        reminder.reminder_type,
        reminder.channel,
        reminder.patient_id,
        reminder.phone,
    );
}
