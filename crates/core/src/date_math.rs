//! Date and time-of-day arithmetic.
//!
//! Calendar days are always taken in UTC for offsets and identifiers, so two callers in
//! different zones agree on "today". Clock times are applied in the zone of the reference
//! timestamp, which is how a patient reads "8:00 AM".

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*([AaPp][Mm])\s*$")
        .expect("clock time pattern is a valid regex")
});

/// The UTC calendar day `at` falls on, time of day stripped.
pub fn utc_day<Tz: TimeZone>(at: &DateTime<Tz>) -> NaiveDate {
    at.with_timezone(&Utc).date_naive()
}

/// `day + days`, clamped to the last representable date.
pub fn add_days(day: NaiveDate, days: u32) -> NaiveDate {
    day.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Parses a 12-hour clock time such as `2:00 PM` or `08:00 am`.
///
/// The hour must be 1 to 12 and the minutes two digits from 00 to 59. Whitespace before the
/// meridiem is optional. Anything else returns `None`.
pub fn parse_clock_time(input: &str) -> Option<NaiveTime> {
    let caps = CLOCK_TIME.captures(input)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }

    let pm = caps[3].eq_ignore_ascii_case("pm");
    let hour24 = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0)
}

/// The instant at local clock time `time` on the same local calendar day as `now`.
///
/// Returns `None` when the local time does not exist on that day (a daylight-saving gap). When
/// it occurs twice, the earlier instant is used.
pub fn on_same_local_day<Tz: TimeZone>(now: &DateTime<Tz>, time: NaiveTime) -> Option<DateTime<Tz>> {
    let local = now.date_naive().and_time(time);
    now.timezone().from_local_datetime(&local).earliest()
}
