//! Signup (participant) model.
//!
//! A signup is one participant's scheduling input: a weekly availability
//! grid already normalized to UTC, plus an optional "if needed" tier the
//! participant would accept when nothing better exists.

use serde::{Deserialize, Serialize};

use super::{AvailabilityGrid, SlotGrid};

/// One participant's scheduling input.
///
/// # Example
/// ```
/// use u_cohort::models::{AvailabilityGrid, Signup, SlotGrid};
///
/// let shape = SlotGrid::default();
/// let signup = Signup::new("alice", AvailabilityGrid::from_indices(shape, [10, 11]))
///     .with_timezone("Europe/Berlin")
///     .with_course("intro-course");
/// assert_eq!(signup.available_cells(), 2);
/// assert!(signup.is_schedulable());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signup {
    /// Stable participant identifier.
    pub id: String,
    /// Cells where the participant is available (UTC).
    pub availability: AvailabilityGrid,
    /// Cells the participant accepts only if needed (UTC).
    pub if_needed: AvailabilityGrid,
    /// Declared timezone. Diagnostics only; never consulted after normalization.
    pub timezone: String,
    /// Whether this participant can facilitate a group.
    pub is_facilitator: bool,
    /// Courses the participant is enrolled in.
    pub courses: Vec<String>,
}

impl Signup {
    /// Creates a signup with UTC availability and an empty if-needed tier.
    pub fn new(id: impl Into<String>, availability: AvailabilityGrid) -> Self {
        let if_needed = AvailabilityGrid::empty(availability.shape());
        Self {
            id: id.into(),
            availability,
            if_needed,
            timezone: "UTC".to_string(),
            is_facilitator: false,
            courses: Vec::new(),
        }
    }

    /// Sets the if-needed tier.
    pub fn with_if_needed(mut self, if_needed: AvailabilityGrid) -> Self {
        self.if_needed = if_needed;
        self
    }

    /// Sets the declared timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Marks this participant as a facilitator.
    pub fn as_facilitator(mut self) -> Self {
        self.is_facilitator = true;
        self
    }

    /// Adds a course enrollment.
    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.courses.push(course.into());
        self
    }

    /// Grid shape of this signup.
    pub fn shape(&self) -> SlotGrid {
        self.availability.shape()
    }

    /// Cells marked available (excluding if-needed).
    pub fn available_cells(&self) -> usize {
        self.availability.count()
    }

    /// Availability including the if-needed tier when `use_if_needed` is set.
    pub fn combined(&self, use_if_needed: bool) -> AvailabilityGrid {
        let mut grid = self.availability.clone();
        if use_if_needed {
            grid.union_with(&self.if_needed);
        }
        grid
    }

    /// Whether the participant has any availability at all.
    pub fn is_schedulable(&self) -> bool {
        !self.availability.is_empty() || !self.if_needed.is_empty()
    }

    /// Returns a copy with `blocked` cells removed from both tiers.
    pub fn without_cells(&self, blocked: &AvailabilityGrid) -> Self {
        let mut signup = self.clone();
        signup.availability.subtract(blocked);
        signup.if_needed.subtract(blocked);
        signup
    }
}
