//! Daily reminder generation.
//!
//! For every patient the generator looks at two independent opportunities: an appointment in
//! the coming window and each medication dose still ahead today. Every opportunity gets a
//! deterministic [`ReminderId`]; anything whose id is already known is dropped, which makes a
//! run idempotent for the calendar day. The generator only reads its inputs and performs no
//! I/O: persisting the result is the caller's job.
//!
//! Appointment ids carry the UTC day of the run, so an appointment is also skipped when the
//! patient already has an appointment reminder for the same instant. Medication ids carry the
//! UTC day of the dose itself, which keeps one id per dose whatever the local offset.

use crate::config::CoreConfig;
use crate::date_math::utc_day;
use crate::medication_time::resolve_medication_time;
use crate::models::{Medication, Patient, Reminder};
use care_ids::{ReminderId, ReminderKey};
use care_types::{Channel, ReminderType};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::fmt::Display;

/// Builds new reminder records from patient snapshots.
#[derive(Clone, Debug)]
pub struct ReminderGenerator {
    channel: Channel,
    appointment_lead: Duration,
    appointment_window: Duration,
}

impl Default for ReminderGenerator {
    fn default() -> Self {
        Self::new(&CoreConfig::default())
    }
}

impl ReminderGenerator {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            channel: cfg.default_channel(),
            appointment_lead: cfg.appointment_lead(),
            appointment_window: cfg.appointment_window(),
        }
    }

    /// Returns the reminders that are due to be created for the day of `now` and are not yet
    /// in `existing`.
    ///
    /// Output order follows `patients`; within a patient the appointment reminder comes first,
    /// then medications in their listed order. `existing` is only read.
    pub fn generate<Tz>(
        &self,
        patients: &[Patient],
        existing: &[Reminder],
        now: &DateTime<Tz>,
    ) -> Vec<Reminder>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let today = utc_day(now);
        let mut seen: HashSet<ReminderId> = existing.iter().map(|r| r.id).collect();
        let mut reminded: HashSet<(String, DateTime<Utc>)> = existing
            .iter()
            .filter(|r| r.reminder_type == ReminderType::Appointment)
            .map(|r| (r.patient_id.clone(), r.scheduled_for))
            .collect();
        let mut fresh = Vec::new();

        for patient in patients {
            let appointment = self
                .appointment_candidate(patient, today, now)
                .filter(|candidate| {
                    let slot = (patient.id.clone(), candidate.scheduled_for);
                    let unreminded = !reminded.contains(&slot);
                    if !unreminded {
                        tracing::debug!(
                            patient_id = %patient.id,
                            reminder_id = %candidate.id,
                            "appointment already reminded"
                        );
                    }
                    unreminded
                });
            let candidates = appointment.into_iter().chain(
                patient
                    .medications
                    .iter()
                    .filter_map(|med| self.medication_candidate(patient, med, now)),
            );

            for candidate in candidates {
                if seen.insert(candidate.id) {
                    if candidate.reminder_type == ReminderType::Appointment {
                        reminded.insert((patient.id.clone(), candidate.scheduled_for));
                    }
                    fresh.push(candidate);
                } else {
                    tracing::debug!(
                        patient_id = %patient.id,
                        reminder_id = %candidate.id,
                        "reminder already generated today"
                    );
                }
            }
        }

        fresh
    }

    fn appointment_candidate<Tz>(
        &self,
        patient: &Patient,
        today: NaiveDate,
        now: &DateTime<Tz>,
    ) -> Option<Reminder>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let appointment = patient.next_appointment?;
        let now_utc = now.with_timezone(&Utc);
        if appointment < now_utc || appointment > now_utc + self.appointment_window {
            return None;
        }

        let local = appointment.with_timezone(&now.timezone());
        let key = ReminderKey::appointment(today, &patient.id);
        tracing::debug!(reminder = %key, "appointment reminder candidate");

        Some(self.reminder(
            patient,
            ReminderId::from_key(&key),
            ReminderType::Appointment,
            appointment_message(
                patient.first_name(),
                &local.format("%d/%m/%Y").to_string(),
                &local.format("%H:%M").to_string(),
            ),
            appointment - self.appointment_lead,
        ))
    }

    fn medication_candidate<Tz>(
        &self,
        patient: &Patient,
        medication: &Medication,
        now: &DateTime<Tz>,
    ) -> Option<Reminder>
    where
        Tz: TimeZone,
    {
        let at = resolve_medication_time(medication, now)?;
        let key = ReminderKey::medication(utc_day(&at), &patient.id, &medication.id);
        tracing::debug!(reminder = %key, "medication reminder candidate");

        Some(self.reminder(
            patient,
            ReminderId::from_key(&key),
            ReminderType::Medication,
            medication_message(patient.first_name(), &medication.name, &medication.dosage),
            at.with_timezone(&Utc),
        ))
    }

    fn reminder(
        &self,
        patient: &Patient,
        id: ReminderId,
        reminder_type: ReminderType,
        message: String,
        scheduled_for: DateTime<Utc>,
    ) -> Reminder {
        Reminder {
            id,
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            phone: patient.phone.clone(),
            channel: self.channel,
            reminder_type,
            message,
            scheduled_for,
            sent: false,
            sent_at: None,
        }
    }
}

/// Generates today's new reminders with the standard configuration.
pub fn generate_daily_reminders<Tz>(
    patients: &[Patient],
    existing: &[Reminder],
    now: &DateTime<Tz>,
) -> Vec<Reminder>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ReminderGenerator::default().generate(patients, existing, now)
}

fn greeting(first_name: &str, word: &str) -> String {
    if first_name.is_empty() {
        format!("{word}!")
    } else {
        format!("{word} {first_name}!")
    }
}

fn appointment_message(first_name: &str, date: &str, time: &str) -> String {
    format!(
        "{} Ukumbusho: una miadi ya kliniki tarehe {date} saa {time}. Tafadhali fika mapema. / \
         {} Reminder: you have a clinic appointment on {date} at {time}. Please arrive early.",
        greeting(first_name, "Habari"),
        greeting(first_name, "Hello"),
    )
}

fn medication_message(first_name: &str, name: &str, dosage: &str) -> String {
    let dose = if dosage.trim().is_empty() {
        name.to_string()
    } else {
        format!("{name} ({})", dosage.trim())
    };
    format!(
        "{} Ni wakati wa kunywa dawa yako: {dose}. / {} It is time to take your medication: {dose}.",
        greeting(first_name, "Habari"),
        greeting(first_name, "Hello"),
    )
}
