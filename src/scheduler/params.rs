//! Run parameters.
//!
//! Immutable for the duration of one run. All fields have defaults, so a
//! host can load a partial configuration from JSON or TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scoring::ScoringRules;
use crate::search::{Budget, SearchConfig};

/// Parameters of a scheduling run.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use u_cohort::scheduler::RunParams;
///
/// let params = RunParams::default()
///     .with_group_size(3, 6)
///     .with_time_budget(Some(Duration::from_secs(5)))
///     .with_seed(7);
/// assert_eq!(params.scoring_rules().max_group_size, 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    /// Minimum members of a placeable group (inclusive).
    pub min_group_size: usize,
    /// Maximum members of a placeable group (inclusive).
    pub max_group_size: usize,
    /// Maximum search iterations.
    pub iteration_budget: Option<u64>,
    /// Maximum wall-clock search time.
    pub time_budget: Option<Duration>,
    /// Seed for the run's random generator.
    pub rng_seed: u64,
    /// Consecutive slots one meeting occupies.
    pub meeting_length_slots: usize,
    /// Whether if-needed availability counts as shared time.
    pub use_if_needed: bool,
    /// Whether every group needs exactly one facilitator.
    pub require_facilitator: bool,
    /// Whether to even out group sizes after the search.
    pub balance: bool,
    /// Search tunables.
    pub search: SearchConfig,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            min_group_size: 4,
            max_group_size: 8,
            iteration_budget: Some(1000),
            time_budget: None,
            rng_seed: 0,
            meeting_length_slots: 1,
            use_if_needed: true,
            require_facilitator: false,
            balance: false,
            search: SearchConfig::default(),
        }
    }
}

impl RunParams {
    /// Sets the group size bounds.
    pub fn with_group_size(mut self, min: usize, max: usize) -> Self {
        self.min_group_size = min;
        self.max_group_size = max;
        self
    }

    /// Sets the iteration budget.
    pub fn with_iteration_budget(mut self, iterations: Option<u64>) -> Self {
        self.iteration_budget = iterations;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_budget(mut self, time: Option<Duration>) -> Self {
        self.time_budget = time;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Sets the meeting length in slots.
    pub fn with_meeting_length(mut self, slots: usize) -> Self {
        self.meeting_length_slots = slots;
        self
    }

    /// Enables or disables the if-needed tier.
    pub fn with_if_needed(mut self, enabled: bool) -> Self {
        self.use_if_needed = enabled;
        self
    }

    /// Enables or disables facilitator mode.
    pub fn with_require_facilitator(mut self, required: bool) -> Self {
        self.require_facilitator = required;
        self
    }

    /// Enables or disables post-search balancing.
    pub fn with_balance(mut self, enabled: bool) -> Self {
        self.balance = enabled;
        self
    }

    /// Sets the search tunables.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Scoring rules derived from these parameters.
    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules {
            min_group_size: self.min_group_size,
            max_group_size: self.max_group_size,
            meeting_length_slots: self.meeting_length_slots,
            use_if_needed: self.use_if_needed,
            require_facilitator: self.require_facilitator,
        }
    }

    /// Stopping budget derived from these parameters.
    pub fn budget(&self) -> Budget {
        Budget {
            iterations: self.iteration_budget,
            time: self.time_budget,
        }
    }
}
