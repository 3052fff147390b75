//! Shared vocabulary for the care scheduling workspace.
//!
//! Every type here is validated on construction, so once a value exists it is known to be one
//! of the accepted spellings. Parsing trims surrounding whitespace and ignores ASCII case;
//! display and serialisation always produce the canonical lowercase form.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated vocabulary types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// Blank input where text is required
    #[error("text must not be blank")]
    Empty,
    /// The input did not match any accepted value for the vocabulary
    #[error("unknown {kind}: '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

/// Trimmed text with at least one non-whitespace character, such as a diagnosis name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Declares a closed vocabulary enum with canonical spellings.
///
/// Generates `as_str`, `ALL`, `Display`, case-insensitive `FromStr` and string-based serde.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical lowercase spelling.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalised = s.trim().to_ascii_lowercase();
                match normalised.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(TypesError::UnknownValue {
                        kind: $kind,
                        value: s.trim().to_owned(),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

vocabulary! {
    /// Clinical severity label supplied by the upstream classifier.
    pub enum Severity ("severity") {
        Mild => "mild",
        Moderate => "moderate",
        Severe => "severe",
        Critical => "critical",
    }
}

vocabulary! {
    /// Condition family that drives the follow-up cadence.
    pub enum ConditionType ("condition type") {
        Pregnancy => "pregnancy",
        Diabetes => "diabetes",
        Hypertension => "hypertension",
        Tuberculosis => "tuberculosis",
        Other => "other",
        /// No condition recorded for the visit.
        Unspecified => "none",
    }
}

vocabulary! {
    /// How the patient presented.
    pub enum VisitType ("visit type") {
        Outpatient => "outpatient",
        Inpatient => "inpatient",
        Emergency => "emergency",
        Followup => "followup",
    }
}

vocabulary! {
    /// Messaging channel a reminder is delivered through.
    pub enum Channel ("channel") {
        Whatsapp => "whatsapp",
        Sms => "sms",
    }
}

vocabulary! {
    /// What a reminder is about.
    pub enum ReminderType ("reminder type") {
        Appointment => "appointment",
        Medication => "medication",
        SymptomCheckin => "symptom_checkin",
    }
}

vocabulary! {
    /// Part of the day a medication is taken in.
    pub enum MedicationSlot ("medication type") {
        Morning => "morning",
        Afternoon => "afternoon",
        Evening => "evening",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        let text = NonEmptyText::new("  Amina Juma ").expect("valid text");
        assert_eq!(text.as_str(), "Amina Juma");

        assert_eq!(NonEmptyText::new("   "), Err(TypesError::Empty));
    }

    #[test]
    fn vocabulary_parses_case_insensitively() {
        assert_eq!("Critical".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!(" EMERGENCY ".parse::<VisitType>(), Ok(VisitType::Emergency));
        assert_eq!("none".parse::<ConditionType>(), Ok(ConditionType::Unspecified));
        assert_eq!(
            "symptom_checkin".parse::<ReminderType>(),
            Ok(ReminderType::SymptomCheckin)
        );
    }

    #[test]
    fn vocabulary_rejects_unknown_values() {
        let err = "urgent".parse::<Severity>().expect_err("should reject");
        assert_eq!(
            err,
            TypesError::UnknownValue {
                kind: "severity",
                value: "urgent".into()
            }
        );
        assert!(err.to_string().contains("severity"));
    }

    #[test]
    fn vocabulary_serialises_canonical_spelling() {
        let json = serde_json::to_string(&Channel::Whatsapp).expect("serialise");
        assert_eq!(json, "\"whatsapp\"");

        let slot: MedicationSlot = serde_json::from_str("\"Evening\"").expect("deserialise");
        assert_eq!(slot, MedicationSlot::Evening);

        let err = serde_json::from_str::<Channel>("\"telegram\"").expect_err("should reject");
        assert!(err.to_string().contains("telegram"));
    }

    #[test]
    fn display_matches_as_str() {
        for severity in Severity::ALL {
            assert_eq!(severity.to_string(), severity.as_str());
            assert_eq!(severity.as_str().parse::<Severity>(), Ok(*severity));
        }
    }
}
