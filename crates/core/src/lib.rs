//! # Care Core
//!
//! Scheduling logic for the care-scheduling engine.
//!
//! This crate contains the clinical follow-up calculator and the daily reminder pipeline:
//! - Suggesting the next appointment date from a diagnosis context
//! - Resolving each medication's dose time for the current day
//! - Generating appointment and medication reminders with deterministic ids, idempotent per day
//! - Store and patient-directory contracts, with in-memory and JSON-file adapters
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and `cli`.
//! Message delivery is left to a collaborator that reads due reminders and marks them sent.

pub mod appointment;
pub mod config;
pub mod constants;
pub mod date_math;
pub mod directory;
pub mod error;
pub mod medication_time;
pub mod models;
pub mod reminders;
pub mod service;
pub mod store;

pub use appointment::{follow_up_offset, suggest_next_appointment, FollowUpOffset, FollowUpRule};
pub use config::CoreConfig;
pub use directory::{InMemoryPatientDirectory, JsonFilePatientDirectory, PatientDirectory};
pub use error::{SchedulingError, SchedulingResult};
pub use medication_time::resolve_medication_time;
pub use models::{AppointmentSuggestion, DiagnosisContext, Medication, Patient, Reminder};
pub use reminders::{generate_daily_reminders, ReminderGenerator};
pub use service::{ReminderService, RunSummary};
pub use store::{InMemoryReminderStore, JsonFileReminderStore, ReminderStore};

pub use care_ids::{ReminderId, ReminderKey};
pub use care_types::{
    Channel, ConditionType, MedicationSlot, NonEmptyText, ReminderType, Severity, TypesError,
    VisitType,
};
