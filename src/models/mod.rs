//! Cohort scheduling domain models.
//!
//! Provides the data types for describing a cohort scheduling problem
//! (weekly availability, signups) and its solution (groups, partitions,
//! run results). All availability is expressed on a fixed weekly grid
//! in UTC.
//!
//! # Domain Mappings
//!
//! | u-cohort | Course platform | Clinic | Sports league |
//! |----------|-----------------|--------|---------------|
//! | Signup | Student enrollment | Patient | Player |
//! | CandidateGroup | Cohort | Therapy group | Team |
//! | Cell | Weekly meeting time | Session slot | Practice slot |
//! | Partition | Cohort roster | Group plan | League roster |

mod grid;
mod group;
mod result;
mod signup;

pub use grid::{AvailabilityGrid, Cell, SlotGrid};
pub use group::CandidateGroup;
pub use result::{Partition, SchedulingResult, StopReason};
pub use signup::Signup;
