//! Constants used throughout the care core crate.
//!
//! Clinical offsets, default dose times and file names live here so that the decision table,
//! the time resolver and the storage adapters agree on one set of values.

/// Filename for persisted reminders under the data directory.
pub const REMINDERS_JSON_FILENAME: &str = "reminders.json";

/// Filename for the patient snapshot list under the data directory.
pub const PATIENTS_JSON_FILENAME: &str = "patients.json";

/// Default directory for scheduling data when none is configured.
pub const DEFAULT_DATA_DIR: &str = "care_data";

/// Seconds between background generation runs in the process runner.
pub const DEFAULT_GENERATION_INTERVAL_SECS: u64 = 3600;

/// Hours before an appointment that its reminder is scheduled for.
pub const APPOINTMENT_LEAD_HOURS: i64 = 2;

/// How far ahead (inclusive) an appointment may be and still get a reminder today.
pub const APPOINTMENT_WINDOW_HOURS: i64 = 24;

// Follow-up offsets, in days.
pub const URGENT_OFFSET_DAYS: u32 = 1;
pub const SEVERE_OFFSET_DAYS: u32 = 3;
pub const PREGNANCY_MODERATE_OFFSET_DAYS: u32 = 7;
pub const PREGNANCY_MILD_OFFSET_DAYS: u32 = 28;
pub const PREGNANCY_ROUTINE_OFFSET_DAYS: u32 = 21;
pub const CHRONIC_MODERATE_OFFSET_DAYS: u32 = 14;
pub const CHRONIC_SEVERE_OFFSET_DAYS: u32 = 7;
pub const CHRONIC_ROUTINE_OFFSET_DAYS: u32 = 30;
pub const TUBERCULOSIS_OFFSET_DAYS: u32 = 30;
pub const DEFAULT_MODERATE_OFFSET_DAYS: u32 = 14;
pub const DEFAULT_SEVERE_OFFSET_DAYS: u32 = 7;
pub const DEFAULT_ROUTINE_OFFSET_DAYS: u32 = 30;

/// Upper bound (inclusive) of the short-interval risk band.
pub const SHORT_INTERVAL_MAX_DAYS: u32 = 3;

/// Upper bound (inclusive) of the two-week review band.
pub const REVIEW_INTERVAL_MAX_DAYS: u32 = 14;

/// Default local dose times as (hour, minute).
pub const MORNING_DOSE_TIME: (u32, u32) = (8, 0);
pub const AFTERNOON_DOSE_TIME: (u32, u32) = (14, 0);
pub const EVENING_DOSE_TIME: (u32, u32) = (19, 0);
pub const UNSPECIFIED_DOSE_TIME: (u32, u32) = (9, 0);
