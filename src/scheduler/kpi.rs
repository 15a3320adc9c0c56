//! Cohort partition quality metrics (KPIs).
//!
//! Computes summary indicators from a finished partition.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Groups | Number of groups formed |
//! | Placed | Participants in a group |
//! | Placement Rate | placed / participants |
//! | Min / Avg / Max Size | Group size spread |
//! | Size Histogram | Groups per size |
//! | If-Needed Groups | Groups meeting on someone's if-needed time |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Partition;

/// Partition quality indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortKpi {
    /// Groups formed.
    pub groups: usize,
    /// Participants placed in a group.
    pub placed: usize,
    /// Participants left unplaced.
    pub unplaced: usize,
    /// Fraction of participants placed (0.0..1.0).
    pub placement_rate: f64,
    /// Smallest group size (0 without groups).
    pub min_group_size: usize,
    /// Mean group size (0.0 without groups).
    pub avg_group_size: f64,
    /// Largest group size (0 without groups).
    pub max_group_size: usize,
    /// Number of groups of each size.
    pub size_histogram: BTreeMap<usize, usize>,
    /// Groups whose meeting relies on if-needed time.
    pub if_needed_groups: usize,
}

impl CohortKpi {
    /// Computes KPIs from a partition.
    pub fn calculate(partition: &Partition) -> Self {
        let placed = partition.placed_count();
        let unplaced = partition.unplaced.len();
        let participants = placed + unplaced;

        let mut size_histogram = BTreeMap::new();
        for group in &partition.groups {
            *size_histogram.entry(group.size()).or_insert(0) += 1;
        }
        let groups = partition.group_count();

        let placement_rate = if participants == 0 {
            0.0
        } else {
            placed as f64 / participants as f64
        };
        let avg_group_size = if groups == 0 {
            0.0
        } else {
            placed as f64 / groups as f64
        };

        Self {
            groups,
            placed,
            unplaced,
            placement_rate,
            min_group_size: size_histogram.keys().next().copied().unwrap_or(0),
            avg_group_size,
            max_group_size: size_histogram.keys().next_back().copied().unwrap_or(0),
            size_histogram,
            if_needed_groups: partition.groups.iter().filter(|g| g.uses_if_needed).count(),
        }
    }

    /// Whether the partition meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_placement_rate: f64, max_size_spread: usize) -> bool {
        self.placement_rate >= min_placement_rate
            && self.max_group_size - self.min_group_size <= max_size_spread
    }
}
