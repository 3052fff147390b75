//! Implementation of reminder keys and their canonical identifiers.

use crate::{IdError, IdResult};
use chrono::NaiveDate;
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Namespace for name-based reminder identifiers.
///
/// Changing this value changes every identifier ever produced, which would defeat
/// deduplication against reminders already in a store.
pub const REMINDER_NAMESPACE: Uuid = Uuid::from_u128(0x5c1e_7a2d_93b4_4f08_a6d1_2e8b_47c9_0f3a);

/// Which reminder opportunity a key refers to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReminderKeyKind {
    /// The patient's upcoming appointment.
    Appointment,
    /// A dose of the medication with this identifier.
    Medication(String),
}

/// The components a reminder's identity is derived from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    day: NaiveDate,
    patient_id: String,
    kind: ReminderKeyKind,
}

impl ReminderKey {
    /// Key for a patient's appointment reminder on `day`.
    pub fn appointment(day: NaiveDate, patient_id: impl Into<String>) -> Self {
        Self {
            day,
            patient_id: patient_id.into(),
            kind: ReminderKeyKind::Appointment,
        }
    }

    /// Key for a patient's reminder to take `medication_id` on `day`.
    pub fn medication(
        day: NaiveDate,
        patient_id: impl Into<String>,
        medication_id: impl Into<String>,
    ) -> Self {
        Self {
            day,
            patient_id: patient_id.into(),
            kind: ReminderKeyKind::Medication(medication_id.into()),
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn kind(&self) -> &ReminderKeyKind {
        &self.kind
    }

    /// Unambiguous byte name hashed into the identifier.
    ///
    /// Each free-text component is length-prefixed so that ids containing separators cannot
    /// collide with a different split of the same characters.
    fn name(&self) -> String {
        let day = self.day.format("%Y-%m-%d");
        let patient = &self.patient_id;
        match &self.kind {
            ReminderKeyKind::Appointment => {
                format!("{day}|{}:{patient}|appointment", patient.len())
            }
            ReminderKeyKind::Medication(med) => {
                format!("{day}|{}:{patient}|med|{}:{med}", patient.len(), med.len())
            }
        }
    }
}

impl fmt::Display for ReminderKey {
    /// Human-readable key: `YYYY-MM-DD/<patient>/appointment` or `YYYY-MM-DD/<patient>/med/<id>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.day.format("%Y-%m-%d"), self.patient_id)?;
        match &self.kind {
            ReminderKeyKind::Appointment => write!(f, "/appointment"),
            ReminderKeyKind::Medication(med) => write!(f, "/med/{med}"),
        }
    }
}

/// Canonical reminder identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed the contained UUID is known to be valid, and its string form is always the
/// canonical one. Identifiers built with [`ReminderId::from_key`] are stable across processes
/// and releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReminderId(Uuid);

impl ReminderId {
    /// Derives the identifier for `key`.
    pub fn from_key(key: &ReminderKey) -> Self {
        Self(Uuid::new_v5(&REMINDER_NAMESPACE, key.name().as_bytes()))
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not 32 lowercase hex characters.
    pub fn parse(input: &str) -> IdResult<Self> {
        if !Self::is_canonical(input) {
            return Err(IdError::InvalidInput(format!(
                "reminder id must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| IdError::InvalidInput(format!("invalid reminder id '{input}': {e}")))
    }

    /// Returns true if `input` is in canonical form.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ReminderId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReminderId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ReminderId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ReminderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ReminderId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn same_key_gives_same_id() {
        let a = ReminderId::from_key(&ReminderKey::appointment(day(2026, 10, 19), "p1"));
        let b = ReminderId::from_key(&ReminderKey::appointment(day(2026, 10, 19), "p1"));
        assert_eq!(a, b);
        assert!(ReminderId::is_canonical(&a.to_string()));
    }

    #[test]
    fn id_changes_with_each_component() {
        let base = ReminderId::from_key(&ReminderKey::medication(day(2026, 10, 19), "p1", "m1"));

        let other_day =
            ReminderId::from_key(&ReminderKey::medication(day(2026, 10, 20), "p1", "m1"));
        let other_patient =
            ReminderId::from_key(&ReminderKey::medication(day(2026, 10, 19), "p2", "m1"));
        let other_med =
            ReminderId::from_key(&ReminderKey::medication(day(2026, 10, 19), "p1", "m2"));
        let appointment = ReminderId::from_key(&ReminderKey::appointment(day(2026, 10, 19), "p1"));

        assert_ne!(base, other_day);
        assert_ne!(base, other_patient);
        assert_ne!(base, other_med);
        assert_ne!(base, appointment);
    }

    #[test]
    fn separators_in_ids_do_not_collide() {
        let a = ReminderId::from_key(&ReminderKey::medication(day(2026, 1, 1), "a|med|b", "c"));
        let b = ReminderId::from_key(&ReminderKey::medication(day(2026, 1, 1), "a", "b|med|c"));
        assert_ne!(a, b);
    }

    #[test]
    fn key_display_is_readable() {
        let key = ReminderKey::medication(day(2024, 2, 29), "p1", "m1");
        assert_eq!(key.to_string(), "2024-02-29/p1/med/m1");

        let key = ReminderKey::appointment(day(2024, 2, 29), "p1");
        assert_eq!(key.to_string(), "2024-02-29/p1/appointment");
    }

    #[test]
    fn parse_accepts_canonical_form() {
        let id = ReminderId::from_key(&ReminderKey::appointment(day(2026, 10, 19), "p1"));
        let parsed: ReminderId = id.to_string().parse().expect("canonical id should parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_non_canonical_forms() {
        let hyphenated = "550e8400-e29b-41d4-a716-446655440000";
        match ReminderId::parse(hyphenated) {
            Err(IdError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }

        assert!(ReminderId::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(ReminderId::parse("550e8400e29b41d4a71644665544000").is_err());
        assert!(ReminderId::parse("550e8400e29b41d4a716446655440zzz").is_err());
        assert!(ReminderId::parse("").is_err());
    }

    #[test]
    fn serde_uses_canonical_string() {
        let id = ReminderId::from_key(&ReminderKey::appointment(day(2026, 10, 19), "p1"));
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, format!("\"{id}\""));

        let back: ReminderId = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, id);

        serde_json::from_str::<ReminderId>("\"not-an-id\"").expect_err("should reject");
    }
}
