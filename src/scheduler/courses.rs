//! Multi-course scheduling.
//!
//! Signups are grouped by course and each course is scheduled on its
//! own. A participant enrolled in several courses keeps one timetable:
//! the cells of every meeting assigned in an earlier course are removed
//! from their availability before later courses are scheduled.
//!
//! # Algorithm
//!
//! 1. Validate the whole signup list once.
//! 2. Bucket signups by course in first-seen order; signups without a
//!    course go to [`UNCATEGORIZED`].
//! 3. For each course: skip it if it has fewer signups than
//!    `min_group_size`, or (facilitator mode) no facilitator. Otherwise
//!    subtract each member's blocked cells, [`run`] the course, and block
//!    the cells of every meeting it produced.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::run::run;
use super::RunParams;
use crate::error::Result;
use crate::models::{AvailabilityGrid, SchedulingResult, Signup};
use crate::search::{CancelSignal, NoProgress, ProgressError, ProgressObserver, ProgressReport};
use crate::validation::{into_error, validate_run};

/// Course name for signups without a course.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Progress of one course within a multi-course run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseProgress<'a> {
    /// Course being scheduled.
    pub course: &'a str,
    /// Position of the course in scheduling order (0-based).
    pub course_index: usize,
    /// Number of courses.
    pub course_count: usize,
    /// The course run's own report.
    pub report: ProgressReport,
}

/// Receives per-course progress.
///
/// Implemented for any `FnMut(&CourseProgress<'_>) -> Result<(), ProgressError>`.
pub trait CourseObserver {
    /// Called at each course run's reporting cadence.
    fn on_course_progress(
        &mut self,
        progress: &CourseProgress<'_>,
    ) -> std::result::Result<(), ProgressError>;
}

impl<F> CourseObserver for F
where
    F: FnMut(&CourseProgress<'_>) -> std::result::Result<(), ProgressError>,
{
    fn on_course_progress(
        &mut self,
        progress: &CourseProgress<'_>,
    ) -> std::result::Result<(), ProgressError> {
        self(progress)
    }
}

impl CourseObserver for NoProgress {
    fn on_course_progress(
        &mut self,
        _progress: &CourseProgress<'_>,
    ) -> std::result::Result<(), ProgressError> {
        Ok(())
    }
}

/// Adapts a course observer to one course's run.
struct ForCourse<'o, 'c> {
    observer: &'o mut dyn CourseObserver,
    course: &'c str,
    course_index: usize,
    course_count: usize,
}

impl ProgressObserver for ForCourse<'_, '_> {
    fn on_progress(&mut self, report: &ProgressReport) -> std::result::Result<(), ProgressError> {
        self.observer.on_course_progress(&CourseProgress {
            course: self.course,
            course_index: self.course_index,
            course_count: self.course_count,
            report: *report,
        })
    }
}

/// Why a course was not scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// Fewer signups than `min_group_size`.
    TooFewSignups,
    /// Facilitator mode and nobody in the course facilitates.
    NoFacilitators,
}

/// Outcome of one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CourseOutcome {
    /// The course was scheduled.
    Scheduled(SchedulingResult),
    /// The course was skipped; everyone in it is unplaced.
    Skipped {
        /// Why.
        reason: SkipReason,
        /// Signup IDs of the course, sorted.
        unplaced: Vec<String>,
    },
}

/// Result of one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseResult {
    /// Course name.
    pub course: String,
    /// What happened.
    pub outcome: CourseOutcome,
}

impl CourseResult {
    /// Participants placed in this course.
    pub fn total_score(&self) -> usize {
        match &self.outcome {
            CourseOutcome::Scheduled(result) => result.total_score(),
            CourseOutcome::Skipped { .. } => 0,
        }
    }

    /// Groups formed in this course.
    pub fn group_count(&self) -> usize {
        match &self.outcome {
            CourseOutcome::Scheduled(result) => result.final_partition.group_count(),
            CourseOutcome::Skipped { .. } => 0,
        }
    }

    /// Signup IDs left without a group in this course.
    pub fn unplaced(&self) -> &[String] {
        match &self.outcome {
            CourseOutcome::Scheduled(result) => &result.final_partition.unplaced,
            CourseOutcome::Skipped { unplaced, .. } => unplaced,
        }
    }

    /// Whether the course was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, CourseOutcome::Skipped { .. })
    }
}

/// Results of all courses plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiCourseResult {
    /// Per-course results in scheduling order.
    pub courses: Vec<CourseResult>,
    /// Placements summed over courses.
    pub total_scheduled: usize,
    /// Groups summed over courses.
    pub total_groups: usize,
    /// Balancing moves summed over courses.
    pub total_balance_moves: usize,
    /// Distinct participants in the input.
    pub total_participants: usize,
}

impl MultiCourseResult {
    /// Result of a course by name.
    pub fn course(&self, name: &str) -> Option<&CourseResult> {
        self.courses.iter().find(|c| c.course == name)
    }
}

/// Schedules every course, blocking cross-course meeting conflicts.
///
/// Fails with `Configuration` if the signup list as a whole is invalid
/// (see [`validate_run`](crate::validation::validate_run)).
#[tracing::instrument(level = "debug", skip_all, fields(participants = signups.len()))]
pub fn run_courses(
    signups: &[Signup],
    params: &RunParams,
    progress: &mut dyn CourseObserver,
    cancel: &dyn CancelSignal,
) -> Result<MultiCourseResult> {
    validate_run(signups, params).map_err(into_error)?;

    let courses = courses_in_order(signups);
    let course_count = courses.len();
    let shape = signups.first().map(|s| s.shape()).unwrap_or_default();
    let mut blocked: HashMap<&str, AvailabilityGrid> = HashMap::new();
    let mut results = Vec::with_capacity(course_count);

    for (course_index, course) in courses.iter().enumerate() {
        let members: Vec<&Signup> = signups.iter().filter(|s| enrolled(s, course)).collect();

        let skip = if members.len() < params.min_group_size {
            Some(SkipReason::TooFewSignups)
        } else if params.require_facilitator && !members.iter().any(|s| s.is_facilitator) {
            Some(SkipReason::NoFacilitators)
        } else {
            None
        };
        if let Some(reason) = skip {
            tracing::debug!(course = %course, ?reason, signups = members.len(), "course skipped");
            let mut unplaced: Vec<String> = members.iter().map(|s| s.id.clone()).collect();
            unplaced.sort();
            results.push(CourseResult {
                course: course.clone(),
                outcome: CourseOutcome::Skipped { reason, unplaced },
            });
            continue;
        }

        let adjusted: Vec<Signup> = members
            .iter()
            .map(|s| match blocked.get(s.id.as_str()) {
                Some(cells) => s.without_cells(cells),
                None => (*s).clone(),
            })
            .collect();

        let mut observer = ForCourse {
            observer: &mut *progress,
            course,
            course_index,
            course_count,
        };
        let result = run(&adjusted, params, &mut observer, cancel)?;

        for group in &result.final_partition.groups {
            let Some(start) = group.meeting_slot.and_then(|cell| shape.index(cell)) else {
                continue;
            };
            let meeting =
                AvailabilityGrid::meeting_cells(shape, start, params.meeting_length_slots);
            for id in &group.member_ids {
                let Some(signup) = members.iter().find(|s| &s.id == id) else {
                    continue;
                };
                blocked
                    .entry(signup.id.as_str())
                    .or_insert_with(|| AvailabilityGrid::empty(shape))
                    .union_with(&meeting);
            }
        }

        results.push(CourseResult {
            course: course.clone(),
            outcome: CourseOutcome::Scheduled(result),
        });
    }

    let total_participants = signups.iter().map(|s| s.id.as_str()).collect::<HashSet<_>>().len();
    let total_balance_moves = results
        .iter()
        .map(|c| match &c.outcome {
            CourseOutcome::Scheduled(result) => result.balance_moves,
            CourseOutcome::Skipped { .. } => 0,
        })
        .sum();

    let summary = MultiCourseResult {
        total_scheduled: results.iter().map(CourseResult::total_score).sum(),
        total_groups: results.iter().map(CourseResult::group_count).sum(),
        total_balance_moves,
        total_participants,
        courses: results,
    };
    tracing::info!(
        courses = summary.courses.len(),
        scheduled = summary.total_scheduled,
        groups = summary.total_groups,
        "multi-course scheduling finished"
    );
    Ok(summary)
}

fn enrolled(signup: &Signup, course: &str) -> bool {
    if signup.courses.is_empty() {
        course == UNCATEGORIZED
    } else {
        signup.courses.iter().any(|c| c == course)
    }
}

fn courses_in_order(signups: &[Signup]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for signup in signups {
        if signup.courses.is_empty() {
            if seen.insert(UNCATEGORIZED.to_string()) {
                order.push(UNCATEGORIZED.to_string());
            }
        }
        for course in &signup.courses {
            if seen.insert(course.clone()) {
                order.push(course.clone());
            }
        }
    }
    order
}
