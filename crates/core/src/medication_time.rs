//! Resolving a medication's dose time for today.

use crate::constants::{
    AFTERNOON_DOSE_TIME, EVENING_DOSE_TIME, MORNING_DOSE_TIME, UNSPECIFIED_DOSE_TIME,
};
use crate::date_math::{on_same_local_day, parse_clock_time};
use crate::models::Medication;
use care_types::MedicationSlot;
use chrono::{DateTime, NaiveTime, TimeZone};

/// Local clock time used when a medication has no usable explicit time.
pub fn default_dose_time(slot: Option<MedicationSlot>) -> NaiveTime {
    let (hour, minute) = match slot {
        Some(MedicationSlot::Morning) => MORNING_DOSE_TIME,
        Some(MedicationSlot::Afternoon) => AFTERNOON_DOSE_TIME,
        Some(MedicationSlot::Evening) => EVENING_DOSE_TIME,
        None => UNSPECIFIED_DOSE_TIME,
    };
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// The local clock time a medication is taken at: its explicit time if it parses, otherwise
/// the default for its part of the day.
pub fn dose_time(medication: &Medication) -> NaiveTime {
    match medication.time.as_deref().and_then(parse_clock_time) {
        Some(time) => time,
        None => {
            if let Some(raw) = medication.time.as_deref().filter(|t| !t.trim().is_empty()) {
                tracing::debug!(
                    medication_id = %medication.id,
                    "dose time {raw:?} not recognised, using default for type"
                );
            }
            default_dose_time(medication.slot)
        }
    }
}

/// Today's dose instant for `medication`, or `None` if it is not strictly after `now`.
///
/// "Today" is the calendar day of `now` in `now`'s own zone. Elapsed doses are not back-filled.
pub fn resolve_medication_time<Tz: TimeZone>(
    medication: &Medication,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let at = on_same_local_day(now, dose_time(medication))?;
    (at > *now).then_some(at)
}
