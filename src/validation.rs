//! Input validation for scheduling runs.
//!
//! Checks structural integrity of the signups and run parameters before
//! any search work begins. Detects:
//! - Empty signup lists
//! - Duplicate signup IDs
//! - Availability grids of differing shape
//! - Impossible group-size bounds or budgets
//! - Facilitator mode without facilitators
//!
//! All problems are collected; [`into_error`] folds them into one
//! [`SchedulingError::Configuration`].

use std::collections::HashSet;

use crate::error::SchedulingError;
use crate::models::Signup;
use crate::scheduler::RunParams;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// No signups were given.
    EmptyInput,
    /// Two signups share the same ID.
    DuplicateId,
    /// A signup's grid differs in shape from the others.
    GridShapeMismatch,
    /// `min_group_size` is zero or exceeds `max_group_size`.
    InvalidGroupBounds,
    /// No stopping budget, or a budget of zero.
    InvalidBudget,
    /// Meeting length is zero or longer than the week.
    InvalidMeetingLength,
    /// Facilitator mode is on but nobody is a facilitator.
    NoFacilitators,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates signups and run parameters.
///
/// Checks:
/// 1. At least one signup
/// 2. No duplicate signup IDs
/// 3. All availability grids (both tiers) share one shape
/// 4. `1 <= min_group_size <= max_group_size`
/// 5. At least one of the iteration and time budgets is set, and each set
///    budget is positive
/// 6. `1 <= meeting_length_slots <= cells per week`
/// 7. In facilitator mode, at least one facilitator
///
/// A `min_group_size` above the number of signups is *not* an error; such a
/// run simply places nobody.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_run(signups: &[Signup], params: &RunParams) -> ValidationResult {
    let mut errors = Vec::new();

    if signups.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyInput,
            "No signups to schedule",
        ));
    }

    let mut ids = HashSet::new();
    for s in signups {
        if !ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate signup ID: {}", s.id),
            ));
        }
    }

    if let Some(first) = signups.first() {
        let shape = first.shape();
        for s in signups {
            if s.availability.shape() != shape || s.if_needed.shape() != shape {
                errors.push(ValidationError::new(
                    ValidationErrorKind::GridShapeMismatch,
                    format!(
                        "Signup '{}' uses {}-minute slots, expected {}",
                        s.id,
                        s.availability.shape().slot_minutes,
                        shape.slot_minutes
                    ),
                ));
            }
        }
    }

    if params.min_group_size == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidGroupBounds,
            "min_group_size must be at least 1",
        ));
    }
    if params.min_group_size > params.max_group_size {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidGroupBounds,
            format!(
                "min_group_size {} exceeds max_group_size {}",
                params.min_group_size, params.max_group_size
            ),
        ));
    }

    match (params.iteration_budget, params.time_budget) {
        (None, None) => errors.push(ValidationError::new(
            ValidationErrorKind::InvalidBudget,
            "At least one of iteration_budget and time_budget is required",
        )),
        (iterations, time) => {
            if iterations == Some(0) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidBudget,
                    "iteration_budget must be positive",
                ));
            }
            if time.is_some_and(|t| t.is_zero()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidBudget,
                    "time_budget must be positive",
                ));
            }
        }
    }

    let week = signups.first().map(|s| s.shape()).unwrap_or_default().cells();
    if params.meeting_length_slots == 0 || params.meeting_length_slots > week {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidMeetingLength,
            format!(
                "meeting_length_slots must be in 1..={week}, got {}",
                params.meeting_length_slots
            ),
        ));
    }

    if params.require_facilitator
        && !signups.is_empty()
        && !signups.iter().any(|s| s.is_facilitator)
    {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoFacilitators,
            "Facilitator mode requires at least one facilitator",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Folds validation errors into a single configuration error.
pub fn into_error(errors: Vec<ValidationError>) -> SchedulingError {
    let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
    SchedulingError::Configuration(messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityGrid, SlotGrid};
    use std::time::Duration;

    fn signup(id: &str) -> Signup {
        Signup::new(id, AvailabilityGrid::from_indices(SlotGrid::default(), [0]))
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_input() {
        let signups = vec![signup("a"), signup("b")];
        assert!(validate_run(&signups, &RunParams::default()).is_ok());
    }

    #[test]
    fn test_empty_input() {
        let kinds = kinds(validate_run(&[], &RunParams::default()));
        assert_eq!(kinds, vec![ValidationErrorKind::EmptyInput]);
    }

    #[test]
    fn test_duplicate_id() {
        let signups = vec![signup("a"), signup("a")];
        let kinds = kinds(validate_run(&signups, &RunParams::default()));
        assert_eq!(kinds, vec![ValidationErrorKind::DuplicateId]);
    }

    #[test]
    fn test_shape_mismatch() {
        let hourly = SlotGrid::new(60).unwrap();
        let signups = vec![
            signup("a"),
            Signup::new("b", AvailabilityGrid::from_indices(hourly, [0])),
        ];
        let kinds = kinds(validate_run(&signups, &RunParams::default()));
        assert_eq!(kinds, vec![ValidationErrorKind::GridShapeMismatch]);
    }

    #[test]
    fn test_collects_all_parameter_errors() {
        let params = RunParams::default()
            .with_group_size(5, 3)
            .with_iteration_budget(None)
            .with_time_budget(None)
            .with_meeting_length(0);
        let kinds = kinds(validate_run(&[signup("a")], &params));
        assert_eq!(
            kinds,
            vec![
                ValidationErrorKind::InvalidGroupBounds,
                ValidationErrorKind::InvalidBudget,
                ValidationErrorKind::InvalidMeetingLength,
            ]
        );
    }

    #[test]
    fn test_zero_budgets() {
        let params = RunParams::default()
            .with_iteration_budget(Some(0))
            .with_time_budget(Some(Duration::ZERO));
        let errors = validate_run(&[signup("a")], &params).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::InvalidBudget));
    }

    #[test]
    fn test_min_above_population_is_valid() {
        let params = RunParams::default().with_group_size(10, 12);
        assert!(validate_run(&[signup("a")], &params).is_ok());
    }

    #[test]
    fn test_no_facilitators() {
        let params = RunParams::default().with_require_facilitator(true);
        let kinds = kinds(validate_run(&[signup("a"), signup("b")], &params));
        assert_eq!(kinds, vec![ValidationErrorKind::NoFacilitators]);

        let signups = vec![signup("a").as_facilitator(), signup("b")];
        assert!(validate_run(&signups, &params).is_ok());
    }

    #[test]
    fn test_into_error() {
        let errors = validate_run(&[], &RunParams::default().with_group_size(0, 3)).unwrap_err();
        let err = into_error(errors);
        assert!(matches!(err, SchedulingError::Configuration(_)));
        assert!(err.to_string().contains("No signups"));
        assert!(err.to_string().contains("min_group_size must be at least 1"));
    }
}
