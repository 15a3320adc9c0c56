//! Cohort scheduling engine.
//!
//! Partitions a pool of course signups into small groups ("cohorts") that
//! share a recurring weekly meeting slot, respecting group-size bounds and
//! maximizing the number of participants placed. The engine is a pure
//! function of its inputs and a random seed.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `SlotGrid`, `AvailabilityGrid`, `Signup`,
//!   `CandidateGroup`, `Partition`, `SchedulingResult`
//! - **`normalize`**: Local weekly availability + IANA timezone → UTC grid
//! - **`scoring`**: Shared meeting slot and score of a member set
//! - **`search`**: Partition state, local moves, cooling, seeded search engine
//! - **`scheduler`**: Run controller (`run`, `run_raw`, `SchedulingRun`),
//!   multi-course scheduling, balancing, KPIs
//! - **`validation`**: Input integrity checks (empty input, duplicate IDs,
//!   grid shapes, bounds, budgets)
//!
//! # Example
//!
//! ```
//! use u_cohort::models::{AvailabilityGrid, Signup, SlotGrid};
//! use u_cohort::scheduler::{run, RunParams};
//! use u_cohort::search::{NeverCancel, NoProgress};
//!
//! let shape = SlotGrid::default();
//! let signups: Vec<Signup> = (0..8)
//!     .map(|i| Signup::new(format!("p{i}"), AvailabilityGrid::from_indices(shape, [40, 41])))
//!     .collect();
//! let params = RunParams::default().with_group_size(3, 4).with_seed(42);
//!
//! let result = run(&signups, &params, &mut NoProgress, &NeverCancel)?;
//! assert_eq!(result.total_score(), 8);
//! assert!(result.final_partition.unplaced.is_empty());
//! # Ok::<(), u_cohort::SchedulingError>(())
//! ```
//!
//! # Logging
//!
//! The crate emits `tracing` events and spans; it never installs a
//! subscriber.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Aarts & Lenstra (2003), "Local Search in Combinatorial Optimization"

pub mod error;
pub mod models;
pub mod normalize;
pub mod scheduler;
pub mod scoring;
pub mod search;
pub mod validation;

pub use error::{Result, SchedulingError};
