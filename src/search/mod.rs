//! Local search over cohort partitions.
//!
//! # Components
//!
//! | Module | Role |
//! |--------|------|
//! | `state` | Arena/index working partition with incremental scoring |
//! | `construct` | Greedy initial partition |
//! | `moves` | Relocate / swap / merge / split neighbourhood |
//! | `cooling` | Acceptance schedule for worsening moves |
//! | `progress` | Caller hooks: progress observer and cancellation |
//! | `engine` | Steppable search state machine |
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Aarts & Lenstra (2003), "Local Search in Combinatorial Optimization"

mod construct;
mod cooling;
mod engine;
mod moves;
mod progress;
mod state;

pub use construct::greedy_partition;
pub use cooling::CoolingSchedule;
pub use engine::{Budget, RunPhase, SearchConfig, SearchEngine};
pub use moves::MoveKind;
pub use progress::{
    CancelFlag, CancelSignal, NeverCancel, NoProgress, ProgressError, ProgressObserver,
    ProgressReport,
};
pub use state::{Location, PartitionState, WorkingGroup};
