//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The parsing helpers take the raw values as arguments rather than
//! reading process-wide environment variables, so services behave the same in multi-threaded
//! runtimes and test harnesses.

use crate::constants::{
    APPOINTMENT_LEAD_HOURS, APPOINTMENT_WINDOW_HOURS, PATIENTS_JSON_FILENAME,
    REMINDERS_JSON_FILENAME,
};
use crate::{SchedulingError, SchedulingResult};
use care_types::Channel;
use chrono::{Duration, FixedOffset, Offset, Utc};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    default_channel: Channel,
    utc_offset: FixedOffset,
    appointment_lead: Duration,
    appointment_window: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with the standard appointment lead (2h) and window (24h).
    pub fn new(data_dir: PathBuf, default_channel: Channel, utc_offset: FixedOffset) -> Self {
        Self {
            data_dir,
            default_channel,
            utc_offset,
            appointment_lead: Duration::hours(APPOINTMENT_LEAD_HOURS),
            appointment_window: Duration::hours(APPOINTMENT_WINDOW_HOURS),
        }
    }

    /// Override the appointment lead and window.
    ///
    /// # Errors
    ///
    /// Returns `SchedulingError::InvalidInput` if either duration is negative or the window is
    /// zero.
    pub fn with_appointment_timing(
        mut self,
        lead: Duration,
        window: Duration,
    ) -> SchedulingResult<Self> {
        if lead < Duration::zero() {
            return Err(SchedulingError::InvalidInput(
                "appointment lead cannot be negative".into(),
            ));
        }
        if window <= Duration::zero() {
            return Err(SchedulingError::InvalidInput(
                "appointment window must be positive".into(),
            ));
        }
        self.appointment_lead = lead;
        self.appointment_window = window;
        Ok(self)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn reminders_path(&self) -> PathBuf {
        self.data_dir.join(REMINDERS_JSON_FILENAME)
    }

    pub fn patients_path(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_JSON_FILENAME)
    }

    pub fn default_channel(&self) -> Channel {
        self.default_channel
    }

    /// Local zone used to place medication times on "today" and to format message times.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    pub fn appointment_lead(&self) -> Duration {
        self.appointment_lead
    }

    pub fn appointment_window(&self) -> Duration {
        self.appointment_window
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(
            PathBuf::from(crate::constants::DEFAULT_DATA_DIR),
            Channel::Whatsapp,
            utc(),
        )
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Resolve the data directory from an optional value.
///
/// `None`, empty or whitespace values fall back to [`crate::constants::DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(crate::constants::DEFAULT_DATA_DIR))
}

/// Parse the default channel from an optional value.
///
/// `None`, empty or whitespace values fall back to WhatsApp.
pub fn channel_from_env_value(value: Option<String>) -> SchedulingResult<Channel> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<Channel>()).transpose()?;

    Ok(parsed.unwrap_or(Channel::Whatsapp))
}

/// Parse the interval, in seconds, between background generation runs.
///
/// `None`, empty or whitespace values fall back to
/// [`crate::constants::DEFAULT_GENERATION_INTERVAL_SECS`]; `0` disables background runs.
pub fn generation_interval_from_env_value(
    value: Option<String>,
) -> SchedulingResult<Option<std::time::Duration>> {
    let secs = match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => crate::constants::DEFAULT_GENERATION_INTERVAL_SECS,
        Some(v) => v.parse::<u64>().map_err(|_| {
            SchedulingError::InvalidInput(format!("invalid generation interval: '{v}'"))
        })?,
    };
    Ok((secs > 0).then(|| std::time::Duration::from_secs(secs)))
}

/// Parse a UTC offset such as `+03:00`, `-0530`, `+3` or `Z`.
///
/// `None`, empty or whitespace values fall back to UTC.
pub fn utc_offset_from_env_value(value: Option<String>) -> SchedulingResult<FixedOffset> {
    let Some(raw) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(utc());
    };
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }

    let invalid = || SchedulingError::InvalidInput(format!("invalid UTC offset: '{raw}'"));

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let is_field = |f: &str| (1..=2).contains(&f.len()) && f.bytes().all(|b| b.is_ascii_digit());
    if !is_field(hours) || !is_field(minutes) {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
