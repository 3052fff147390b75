//! Deterministic reminder identifiers.
//!
//! A reminder's identity is the logical opportunity it represents: one calendar day, one
//! patient, one kind of reminder and (for medication reminders) one medication. Two independent
//! generation runs that discover the same opportunity must produce the same identifier, so the
//! store can refuse the second copy.
//!
//! ## Canonical form
//! Identifiers are name-based UUIDs (RFC 4122 version 5) rendered as **32 lowercase hexadecimal
//! characters** (no hyphens), e.g. `6f1c0d9e2b7a5c3e8d4f1a2b3c4d5e6f`.
//!
//! - [`ReminderKey`] holds the components and renders a human-readable key for logs.
//! - [`ReminderId`] is the hashed, canonical identifier stored on the reminder record.
//! - [`ReminderId::parse`] only accepts the canonical form; hyphenated or uppercase input is
//!   rejected so that string comparison in stores stays exact.

mod reminder_id;

pub use reminder_id::{ReminderId, ReminderKey, ReminderKeyKind, REMINDER_NAMESPACE};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
