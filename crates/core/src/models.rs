//! Records the engine reads and produces.
//!
//! Patient and medication snapshots are owned by the surrounding record system and are only
//! read here. Their deserialisers are deliberately forgiving: a value the engine cannot use is
//! loaded as absent (with a warning) so that one bad field never hides a whole patient.

use care_ids::ReminderId;
use care_types::{
    Channel, ConditionType, MedicationSlot, NonEmptyText, ReminderType, Severity, VisitType,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A medication the patient is currently taking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    /// Free-text dose time, expected as `H:MM AM|PM`.
    #[serde(default)]
    pub time: Option<String>,
    /// Part of the day; `None` when missing or not a recognised value.
    #[serde(rename = "type", default, deserialize_with = "lenient_slot")]
    pub slot: Option<MedicationSlot>,
}

/// Read-only view of a patient used for reminder generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub next_appointment: Option<DateTime<Utc>>,
    #[serde(default)]
    pub medications: Vec<Medication>,
}

impl Patient {
    /// First word of the patient's name, used in greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

/// A reminder record as persisted by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub patient_id: String,
    pub patient_name: String,
    pub phone: String,
    pub channel: Channel,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub message: String,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub sent: bool,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
}

impl Reminder {
    /// Unsent and scheduled at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.sent && self.scheduled_for <= now
    }
}

/// Clinical context of the visit a follow-up is being suggested for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisContext {
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default = "unspecified_condition")]
    pub condition_type: ConditionType,
    pub visit_type: VisitType,
    #[serde(default)]
    pub diagnosis_name: Option<NonEmptyText>,
}

fn unspecified_condition() -> ConditionType {
    ConditionType::Unspecified
}

/// A proposed follow-up date. Advisory only: the clinician may override it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSuggestion {
    pub suggested_date: NaiveDate,
    pub days_from_now: u32,
    pub rationale: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    EpochMillis(i64),
    Other(serde::de::IgnoredAny),
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    let parsed = match raw {
        None => None,
        Some(RawTimestamp::Text(text)) => {
            let parsed = parse_timestamp(&text);
            if parsed.is_none() && !text.trim().is_empty() {
                tracing::warn!("ignoring unparseable appointment timestamp: {text:?}");
            }
            parsed
        }
        Some(RawTimestamp::EpochMillis(ms)) => DateTime::from_timestamp_millis(ms),
        Some(RawTimestamp::Other(_)) => {
            tracing::warn!("ignoring appointment timestamp of unexpected type");
            None
        }
    };
    Ok(parsed)
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM[:SS]` taken as UTC.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_slot<'de, D>(deserializer: D) -> Result<Option<MedicationSlot>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse::<MedicationSlot>() {
        Ok(slot) => Some(slot),
        Err(e) => {
            tracing::debug!("medication type not recognised, using default dose time: {e}");
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn patient_parses_with_all_fields() {
        let json = r#"{
            "id": "p1",
            "name": "Amina Juma",
            "phone": "+255700000001",
            "next_appointment": "2026-10-19T11:00:00Z",
            "medications": [
                {"id": "m1", "name": "Metformin", "dosage": "500mg", "time": "08:00 AM", "type": "morning"}
            ]
        }"#;

        let patient: Patient = serde_json::from_str(json).expect("parse patient");
        assert_eq!(patient.first_name(), "Amina");
        assert_eq!(
            patient.next_appointment,
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 11, 0, 0).unwrap())
        );
        assert_eq!(patient.medications[0].slot, Some(MedicationSlot::Morning));
        assert_eq!(patient.medications[0].time.as_deref(), Some("08:00 AM"));
    }

    #[test]
    fn unparseable_appointment_is_absent() {
        let json = r#"{"id": "p1", "name": "Amina", "next_appointment": "next tuesday"}"#;
        let patient: Patient = serde_json::from_str(json).expect("parse patient");
        assert_eq!(patient.next_appointment, None);

        let json = r#"{"id": "p1", "name": "Amina", "next_appointment": {"seconds": 1}}"#;
        let patient: Patient = serde_json::from_str(json).expect("parse patient");
        assert_eq!(patient.next_appointment, None);

        let json = r#"{"id": "p1", "name": "Amina", "next_appointment": null}"#;
        let patient: Patient = serde_json::from_str(json).expect("parse patient");
        assert_eq!(patient.next_appointment, None);
    }

    #[test]
    fn appointment_accepts_offsets_and_epoch_millis() {
        let json = r#"{"id": "p1", "name": "Amina", "next_appointment": "2026-10-19T14:00:00+03:00"}"#;
        let patient: Patient = serde_json::from_str(json).expect("parse patient");
        assert_eq!(
            patient.next_appointment,
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 11, 0, 0).unwrap())
        );

        let millis = Utc
            .with_ymd_and_hms(2026, 10, 19, 11, 0, 0)
            .unwrap()
            .timestamp_millis();
        let json = format!(r#"{{"id": "p1", "name": "Amina", "next_appointment": {millis}}}"#);
        let patient: Patient = serde_json::from_str(&json).expect("parse patient");
        assert_eq!(
            patient.next_appointment,
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 11, 0, 0).unwrap())
        );
    }

    #[test]
    fn unknown_medication_type_is_absent() {
        let json = r#"{"id": "m1", "name": "Iron", "dosage": "1 tab", "type": "bedtime"}"#;
        let med: Medication = serde_json::from_str(json).expect("parse medication");
        assert_eq!(med.slot, None);
        assert_eq!(med.time, None);
    }

    #[test]
    fn diagnosis_context_defaults() {
        let json = r#"{"visit_type": "outpatient"}"#;
        let ctx: DiagnosisContext = serde_json::from_str(json).expect("parse context");
        assert_eq!(ctx.severity, None);
        assert_eq!(ctx.condition_type, ConditionType::Unspecified);
        assert_eq!(ctx.diagnosis_name, None);
    }

    #[test]
    fn reminder_due_only_when_unsent_and_scheduled() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let mut reminder = Reminder {
            id: ReminderId::from_key(&care_ids::ReminderKey::appointment(now.date_naive(), "p1")),
            patient_id: "p1".into(),
            patient_name: "Amina".into(),
            phone: "+255700000001".into(),
            channel: Channel::Whatsapp,
            reminder_type: ReminderType::Appointment,
            message: "hello".into(),
            scheduled_for: now,
            sent: false,
            sent_at: None,
        };
        assert!(reminder.is_due(now));
        assert!(!reminder.is_due(now - chrono::Duration::seconds(1)));

        reminder.sent = true;
        assert!(!reminder.is_due(now));
    }
}
