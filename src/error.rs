//! Error types.
//!
//! Only malformed input and impossible run parameters are errors.
//! Unplaceable participants, zero-overlap groups and cancelled runs are
//! normal outcomes carried in [`SchedulingResult`](crate::models::SchedulingResult).

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SchedulingError>;

/// Errors surfaced to the caller before any search work is done.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// The timezone identifier is not in the IANA database.
    #[error("unrecognized timezone identifier: {0:?}")]
    InvalidTimezone(String),

    /// A local slot lies outside the week grid.
    #[error("invalid slot (day {day}, slot {slot}): {reason}")]
    InvalidSlot {
        /// Day-of-week as given (0 = Monday).
        day: u8,
        /// Slot-of-day as given.
        slot: u16,
        /// What is wrong with it.
        reason: String,
    },

    /// Run parameters or inputs that make a run impossible.
    #[error("invalid run configuration: {0}")]
    Configuration(String),
}

impl SchedulingError {
    pub(crate) fn invalid_slot(day: u8, slot: u16, reason: impl Into<String>) -> Self {
        Self::InvalidSlot {
            day,
            slot,
            reason: reason.into(),
        }
    }

    /// Whether this error came from normalizer input rather than run parameters.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidTimezone(_) | Self::InvalidSlot { .. })
    }
}
