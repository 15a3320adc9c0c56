//! Scheduling output models.
//!
//! A [`Partition`] assigns every input signup either to exactly one group
//! or to the unplaced list. A [`SchedulingResult`] wraps the best partition
//! seen during a run with run statistics.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::CandidateGroup;

/// A complete assignment of signups to groups or to "unplaced".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Groups, in stable order.
    pub groups: Vec<CandidateGroup>,
    /// Signup IDs not in any group, sorted.
    pub unplaced: Vec<String>,
    /// Sum of group scores.
    pub total_score: usize,
}

impl Partition {
    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of participants placed in a group.
    pub fn placed_count(&self) -> usize {
        self.groups.iter().map(|g| g.size()).sum()
    }

    /// Group containing a signup, if any.
    pub fn group_of(&self, id: &str) -> Option<&CandidateGroup> {
        self.groups.iter().find(|g| g.contains(id))
    }

    /// Whether a signup ended up unplaced.
    pub fn is_unplaced(&self, id: &str) -> bool {
        self.unplaced.iter().any(|u| u == id)
    }

    /// Checks the partition invariant against the input IDs.
    ///
    /// Every ID appears exactly once across groups and unplaced, and no
    /// unknown ID appears.
    pub fn covers_exactly<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        let expected: HashSet<&str> = ids.into_iter().collect();
        let mut seen = HashSet::new();
        let all = self
            .groups
            .iter()
            .flat_map(|g| g.member_ids.iter())
            .chain(self.unplaced.iter());
        for id in all {
            if !expected.contains(id.as_str()) || !seen.insert(id.as_str()) {
                return false;
            }
        }
        seen.len() == expected.len()
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    /// No accepted improving move within the convergence window, or
    /// nothing left to place.
    Converged,
    /// Iteration or time budget reached.
    BudgetExhausted,
    /// The caller signalled cancellation.
    Cancelled,
}

/// Final output of a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingResult {
    /// Best partition observed across the whole run.
    pub final_partition: Partition,
    /// Search iterations executed.
    pub iterations_run: u64,
    /// Iteration at which the best partition was first reached (0 = initial).
    pub best_iteration: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Why the run stopped.
    pub stopped_reason: StopReason,
    /// Post-search balancing moves applied (0 when balancing is off).
    pub balance_moves: usize,
}

impl SchedulingResult {
    /// Objective value of the final partition.
    pub fn total_score(&self) -> usize {
        self.final_partition.total_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn group(ids: &[&str]) -> CandidateGroup {
        CandidateGroup {
            member_ids: ids.iter().map(|s| s.to_string()).collect(),
            meeting_slot: Some(Cell::new(0, 0)),
            score: ids.len(),
            shared_cells: 1,
            uses_if_needed: false,
        }
    }

    #[test]
    fn test_partition_queries() {
        let partition = Partition {
            groups: vec![group(&["a", "b"]), group(&["c", "d", "e"])],
            unplaced: vec!["f".into()],
            total_score: 5,
        };
        assert_eq!(partition.group_count(), 2);
        assert_eq!(partition.placed_count(), 5);
        assert_eq!(partition.group_of("d").map(|g| g.size()), Some(3));
        assert!(partition.group_of("f").is_none());
        assert!(partition.is_unplaced("f"));
        assert!(partition.covers_exactly(["a", "b", "c", "d", "e", "f"]));
    }

    #[test]
    fn test_covers_exactly_detects_violations() {
        let duplicated = Partition {
            groups: vec![group(&["a", "b"])],
            unplaced: vec!["a".into()],
            total_score: 2,
        };
        assert!(!duplicated.covers_exactly(["a", "b"]));

        let missing = Partition {
            groups: vec![group(&["a"])],
            unplaced: vec![],
            total_score: 1,
        };
        assert!(!missing.covers_exactly(["a", "b"]));

        let unknown = Partition {
            groups: vec![],
            unplaced: vec!["z".into()],
            total_score: 0,
        };
        assert!(!unknown.covers_exactly(["a"]));
    }
}
