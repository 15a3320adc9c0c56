//! Scheduling entry points and result evaluation.
//!
//! # Entry points
//!
//! | Function | Input | Use |
//! |----------|-------|-----|
//! | [`run`] | UTC signups | One pool, one call |
//! | [`run_raw`] | Local availability + timezone | Normalize, then `run` |
//! | [`SchedulingRun`] | UTC signups | One batch per `advance`, for cooperative hosts |
//! | [`run_courses`] | Signups tagged with courses | Per-course runs without timetable clashes |
//!
//! # KPI
//!
//! `CohortKpi` summarizes a partition: placement rate, group size spread,
//! and reliance on if-needed time.

mod balance;
mod courses;
mod kpi;
mod params;
mod run;

pub use balance::balance_groups;
pub use courses::{
    run_courses, CourseObserver, CourseOutcome, CourseProgress, CourseResult, MultiCourseResult,
    SkipReason, UNCATEGORIZED,
};
pub use kpi::CohortKpi;
pub use params::RunParams;
pub use run::{run, run_raw, SchedulingRun};
