//! Scheduling operations wired to configuration and collaborators.

use crate::appointment::suggest_next_appointment;
use crate::config::CoreConfig;
use crate::date_math::utc_day;
use crate::directory::PatientDirectory;
use crate::error::SchedulingResult;
use crate::models::{AppointmentSuggestion, DiagnosisContext, Reminder};
use crate::reminders::ReminderGenerator;
use crate::store::ReminderStore;
use care_ids::ReminderId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one daily generation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// UTC calendar day the run generated reminders for.
    pub day: NaiveDate,
    pub patients: usize,
    /// Candidates not already present in the store when the run started.
    pub candidates_new: usize,
    /// Reminders actually written; lower than `candidates_new` only if a concurrent run won.
    pub inserted: usize,
    pub reminders: Vec<Reminder>,
}

/// Service for suggesting follow-ups and running daily reminder generation.
#[derive(Clone)]
pub struct ReminderService {
    cfg: Arc<CoreConfig>,
}

impl ReminderService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Suggests the next appointment counted from the UTC day of `now`.
    pub fn suggest(&self, ctx: &DiagnosisContext, now: DateTime<Utc>) -> AppointmentSuggestion {
        suggest_next_appointment(ctx, &now)
    }

    /// Generates and stores the reminders for the day of `now`.
    ///
    /// Running this more than once on the same UTC day adds nothing new. Two runs racing on
    /// the same store still store each reminder once, because the store refuses known ids.
    ///
    /// # Errors
    ///
    /// Propagates failures from the directory or the store.
    pub fn run_daily(
        &self,
        directory: &dyn PatientDirectory,
        store: &dyn ReminderStore,
        now: DateTime<Utc>,
    ) -> SchedulingResult<RunSummary> {
        let patients = directory.patients()?;
        let existing = store.existing()?;

        let local_now = now.with_timezone(&self.cfg.utc_offset());
        let reminders = ReminderGenerator::new(&self.cfg).generate(&patients, &existing, &local_now);
        let inserted = store.insert_if_absent(&reminders)?;

        let summary = RunSummary {
            day: utc_day(&now),
            patients: patients.len(),
            candidates_new: reminders.len(),
            inserted,
            reminders,
        };
        tracing::info!(
            day = %summary.day,
            patients = summary.patients,
            candidates_new = summary.candidates_new,
            inserted = summary.inserted,
            "daily reminder run complete"
        );
        Ok(summary)
    }

    /// Unsent reminders due at `now`.
    pub fn due(&self, store: &dyn ReminderStore, now: DateTime<Utc>) -> SchedulingResult<Vec<Reminder>> {
        store.due(now)
    }

    /// Records that a reminder has been delivered.
    pub fn mark_sent(
        &self,
        store: &dyn ReminderStore,
        id: ReminderId,
        sent_at: DateTime<Utc>,
    ) -> SchedulingResult<()> {
        store.mark_sent(id, sent_at)?;
        tracing::info!(reminder_id = %id, "reminder marked sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{InMemoryPatientDirectory, JsonFilePatientDirectory};
    use crate::models::Patient;
    use crate::store::{InMemoryReminderStore, JsonFileReminderStore};
    use care_types::{Channel, ConditionType, ReminderType, Severity, VisitType};
    use chrono::{FixedOffset, TimeZone};
    use std::path::Path;
    use tempfile::TempDir;

    fn test_cfg(data_dir: &Path, offset_hours: i32) -> Arc<CoreConfig> {
        let offset = FixedOffset::east_opt(offset_hours * 3600).expect("valid offset");
        Arc::new(CoreConfig::new(data_dir.to_path_buf(), Channel::Sms, offset))
    }

    fn patients() -> Vec<Patient> {
        serde_json::from_value(serde_json::json!([
            {
                "id": "p1",
                "name": "Amina Juma",
                "phone": "+255700000001",
                "next_appointment": "2026-10-19T11:00:00Z",
                "medications": [
                    {"id": "m1", "name": "Metformin", "dosage": "500mg", "time": "08:00 AM"}
                ]
            },
            {
                "id": "p2",
                "name": "Baraka Mushi",
                "phone": "+255700000002",
                "medications": [{"id": "m2", "name": "Iron", "type": "evening"}]
            }
        ]))
        .expect("valid patients")
    }

    #[test]
    fn run_daily_is_idempotent_for_the_day() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = ReminderService::new(test_cfg(temp_dir.path(), 0));
        let directory = InMemoryPatientDirectory::new(patients());
        let store = InMemoryReminderStore::new();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 6, 0, 0).unwrap();

        let first = service
            .run_daily(&directory, &store, now)
            .expect("first run");
        assert_eq!(first.day, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(first.patients, 2);
        assert_eq!(first.candidates_new, 3);
        assert_eq!(first.inserted, 3);
        assert!(first.reminders.iter().all(|r| r.channel == Channel::Sms));

        let second = service
            .run_daily(&directory, &store, now + chrono::Duration::hours(1))
            .expect("second run");
        assert_eq!(second.candidates_new, 0);
        assert_eq!(second.inserted, 0);
        assert_eq!(store.existing().unwrap().len(), 3);
    }

    #[test]
    fn run_daily_uses_configured_local_zone_for_doses() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = ReminderService::new(test_cfg(temp_dir.path(), 3));
        let directory = InMemoryPatientDirectory::new(patients());
        let store = InMemoryReminderStore::new();
        // 04:00 local in UTC+3: the 08:00 local dose is 05:00 UTC.
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 1, 0, 0).unwrap();

        let summary = service.run_daily(&directory, &store, now).expect("run");
        let dose = summary
            .reminders
            .iter()
            .find(|r| r.patient_id == "p1" && r.reminder_type == ReminderType::Medication)
            .expect("dose reminder");
        assert_eq!(
            dose.scheduled_for,
            Utc.with_ymd_and_hms(2026, 10, 19, 5, 0, 0).unwrap()
        );
        // Appointment at 11:00 UTC is shown as 14:00 local.
        let appointment = summary
            .reminders
            .iter()
            .find(|r| r.reminder_type == ReminderType::Appointment)
            .expect("appointment reminder");
        assert!(appointment.message.contains("19/10/2026"));
        assert!(appointment.message.contains("14:00"));
    }

    #[test]
    fn hourly_runs_west_of_utc_store_each_reminder_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = ReminderService::new(test_cfg(temp_dir.path(), -5));
        let directory = InMemoryPatientDirectory::new(serde_json::from_value(serde_json::json!([
            {
                "id": "p1",
                "name": "Amina Juma",
                "phone": "+255700000001",
                "next_appointment": "2026-10-20T09:00:00Z",
                "medications": [
                    {"id": "m1", "name": "Metformin", "dosage": "500mg", "time": "9:00 PM"}
                ]
            }
        ]))
        .expect("valid patients"));
        let store = InMemoryReminderStore::new();

        // Every hour from 06:00 local on the 19th to 06:00 local on the 20th.
        let start = Utc.with_ymd_and_hms(2026, 10, 19, 11, 0, 0).unwrap();
        for hour in 0..=24 {
            service
                .run_daily(&directory, &store, start + chrono::Duration::hours(hour))
                .expect("run");
        }

        let stored = store.existing().unwrap();
        let appointments = stored
            .iter()
            .filter(|r| r.reminder_type == ReminderType::Appointment)
            .count();
        assert_eq!(appointments, 1);

        let mut doses: Vec<_> = stored
            .iter()
            .filter(|r| r.reminder_type == ReminderType::Medication)
            .map(|r| r.scheduled_for)
            .collect();
        doses.sort();
        assert_eq!(
            doses,
            vec![
                Utc.with_ymd_and_hms(2026, 10, 20, 2, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 10, 21, 2, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn run_daily_against_json_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path(), 0);
        std::fs::write(
            cfg.patients_path(),
            serde_json::to_string(&patients()).expect("serialise patients"),
        )
        .expect("write patients");

        let service = ReminderService::new(Arc::clone(&cfg));
        let directory = JsonFilePatientDirectory::new(cfg.patients_path());
        let store = JsonFileReminderStore::new(cfg.reminders_path());
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 6, 0, 0).unwrap();

        assert_eq!(service.run_daily(&directory, &store, now).unwrap().inserted, 3);
        let reopened = JsonFileReminderStore::new(cfg.reminders_path());
        assert_eq!(
            service
                .run_daily(&directory, &reopened, now)
                .unwrap()
                .inserted,
            0
        );

        let due = service
            .due(&reopened, Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap())
            .expect("due");
        assert_eq!(due.len(), 2);

        service
            .mark_sent(&reopened, due[0].id, now)
            .expect("mark sent");
        assert_eq!(
            service
                .due(&reopened, Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap())
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn suggest_counts_from_utc_day() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = ReminderService::new(test_cfg(temp_dir.path(), 3));
        let ctx = DiagnosisContext {
            severity: Some(Severity::Severe),
            condition_type: ConditionType::Other,
            visit_type: VisitType::Outpatient,
            diagnosis_name: None,
        };
        // Already the 19th in UTC+3, still the 18th in UTC.
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 22, 0, 0).unwrap();

        let suggestion = service.suggest(&ctx, now);
        assert_eq!(suggestion.days_from_now, 3);
        assert_eq!(
            suggestion.suggested_date,
            NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
        );
    }
}
