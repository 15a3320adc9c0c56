//! Candidate group scoring.
//!
//! Evaluates a set of signups: finds the cells where every member can
//! meet, chooses the group's meeting slot, and scores the group.
//!
//! # Algorithm
//!
//! 1. AND the members' grids. With the if-needed tier enabled, two
//!    intersections are kept: *strict* (available only) and *relaxed*
//!    (available or if-needed).
//! 2. Reduce each to meeting start cells (`meeting_length_slots`
//!    consecutive shared cells, wrapping the week).
//! 3. Choose the tier: strict if it has any start cell, else relaxed.
//! 4. Within the tier, pick the start cell lying in the longest cyclic run
//!    of shared start cells (most slack for later rescheduling); ties go
//!    to the earliest cell index.
//! 5. Score = member count if a slot was found, else 0.
//!
//! # Complexity
//! O(m · W + C) where m = members, W = grid words, C = cells per week.

use serde::{Deserialize, Serialize};

use crate::models::{AvailabilityGrid, CandidateGroup, Signup, SlotGrid};

/// Rules shared by every evaluation in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Minimum members for a placeable group.
    pub min_group_size: usize,
    /// Maximum members for a placeable group.
    pub max_group_size: usize,
    /// Consecutive cells a meeting occupies.
    pub meeting_length_slots: usize,
    /// Whether if-needed cells count as shared.
    pub use_if_needed: bool,
    /// Whether a placeable group needs exactly one facilitator.
    pub require_facilitator: bool,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            min_group_size: 4,
            max_group_size: 8,
            meeting_length_slots: 1,
            use_if_needed: true,
            require_facilitator: false,
        }
    }
}

/// Index-level evaluation of a member set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupEval {
    /// Chosen meeting start cell index.
    pub meeting_slot: Option<usize>,
    /// Member count if a meeting slot exists, else 0.
    pub score: usize,
    /// Start cells every member can attend (relaxed tier).
    pub shared_cells: usize,
    /// Whether the slot came from the relaxed tier.
    pub uses_if_needed: bool,
    /// Facilitators among the members.
    pub facilitators: usize,
    /// Member count.
    pub size: usize,
}

impl GroupEval {
    /// Evaluation of an empty member set.
    pub const EMPTY: Self = Self {
        meeting_slot: None,
        score: 0,
        shared_cells: 0,
        uses_if_needed: false,
        facilitators: 0,
        size: 0,
    };
}

/// Scores member sets against a fixed signup list.
///
/// Members are referred to by their index in the signup slice. The
/// scorer never mutates the signups and is safe to call repeatedly.
#[derive(Debug, Clone)]
pub struct Scorer<'a> {
    signups: &'a [Signup],
    relaxed: Vec<AvailabilityGrid>,
    rules: ScoringRules,
    shape: SlotGrid,
}

impl<'a> Scorer<'a> {
    /// Creates a scorer. All signups must share one grid shape.
    pub fn new(signups: &'a [Signup], rules: ScoringRules) -> Self {
        let shape = signups.first().map(|s| s.shape()).unwrap_or_default();
        let relaxed = signups
            .iter()
            .map(|s| s.combined(rules.use_if_needed))
            .collect();
        Self {
            signups,
            relaxed,
            rules,
            shape,
        }
    }

    /// Rules in effect.
    #[inline]
    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// The signups being scored.
    #[inline]
    pub fn signups(&self) -> &'a [Signup] {
        self.signups
    }

    /// Grid shape of the run.
    #[inline]
    pub fn shape(&self) -> SlotGrid {
        self.shape
    }

    /// Availability of one signup including if-needed cells when enabled.
    #[inline]
    pub fn relaxed_grid(&self, index: usize) -> &AvailabilityGrid {
        &self.relaxed[index]
    }

    /// Meeting start cells of a relaxed intersection.
    pub fn starts(&self, shared: &AvailabilityGrid) -> AvailabilityGrid {
        shared.meeting_starts(self.rules.meeting_length_slots)
    }

    /// Evaluates a member set given as signup indices.
    pub fn evaluate_members(&self, members: &[usize]) -> GroupEval {
        let Some((&first, rest)) = members.split_first() else {
            return GroupEval::EMPTY;
        };

        let mut strict = self.signups[first].availability.clone();
        let mut relaxed = self.relaxed[first].clone();
        for &m in rest {
            strict.intersect_with(&self.signups[m].availability);
            relaxed.intersect_with(&self.relaxed[m]);
        }
        let facilitators = members
            .iter()
            .filter(|&&m| self.signups[m].is_facilitator)
            .count();

        let length = self.rules.meeting_length_slots;
        let relaxed_starts = relaxed.meeting_starts(length);
        let strict_starts = strict.meeting_starts(length);

        let (tier, uses_if_needed) = if !strict_starts.is_empty() {
            (&strict_starts, false)
        } else {
            (&relaxed_starts, true)
        };
        let meeting_slot = best_start(tier);

        GroupEval {
            meeting_slot,
            score: if meeting_slot.is_some() { members.len() } else { 0 },
            shared_cells: relaxed_starts.count(),
            uses_if_needed: meeting_slot.is_some() && uses_if_needed,
            facilitators,
            size: members.len(),
        }
    }

    /// Whether an evaluated group may appear in a final partition.
    pub fn is_placeable(&self, eval: &GroupEval) -> bool {
        eval.meeting_slot.is_some()
            && eval.size >= self.rules.min_group_size
            && eval.size <= self.rules.max_group_size
            && (!self.rules.require_facilitator || eval.facilitators == 1)
    }

    /// Contribution of a group to a partition's total score.
    #[inline]
    pub fn contribution(&self, eval: &GroupEval) -> usize {
        if self.is_placeable(eval) {
            eval.score
        } else {
            0
        }
    }

    /// Builds the ID-level view of an evaluated member set.
    pub fn to_candidate(&self, members: &[usize], eval: &GroupEval) -> CandidateGroup {
        let mut member_ids: Vec<String> =
            members.iter().map(|&m| self.signups[m].id.clone()).collect();
        member_ids.sort();
        CandidateGroup {
            member_ids,
            meeting_slot: eval.meeting_slot.map(|i| self.shape.cell_at(i)),
            score: eval.score,
            shared_cells: eval.shared_cells,
            uses_if_needed: eval.uses_if_needed,
        }
    }

    /// Evaluates a member set given as signup IDs. Unknown IDs are ignored.
    pub fn evaluate(&self, member_ids: &[&str]) -> CandidateGroup {
        let mut members: Vec<usize> = member_ids
            .iter()
            .filter_map(|id| self.signups.iter().position(|s| s.id == *id))
            .collect();
        members.sort_unstable();
        members.dedup();
        let eval = self.evaluate_members(&members);
        self.to_candidate(&members, &eval)
    }
}

/// Evaluates `member_ids` against `all_signups`.
///
/// # Example
/// ```
/// use u_cohort::models::{AvailabilityGrid, Cell, Signup, SlotGrid};
/// use u_cohort::scoring::{evaluate, ScoringRules};
///
/// let shape = SlotGrid::default();
/// let signups = vec![
///     Signup::new("a", AvailabilityGrid::from_indices(shape, [5, 6, 7])),
///     Signup::new("b", AvailabilityGrid::from_indices(shape, [6, 7, 8])),
/// ];
/// let group = evaluate(&["a", "b"], &signups, &ScoringRules::default());
/// assert_eq!(group.meeting_slot, Some(Cell::new(0, 6)));
/// assert_eq!(group.score, 2);
/// ```
pub fn evaluate(
    member_ids: &[&str],
    all_signups: &[Signup],
    rules: &ScoringRules,
) -> CandidateGroup {
    Scorer::new(all_signups, *rules).evaluate(member_ids)
}

/// Start cell in the longest cyclic run of `starts`; earliest index on ties.
fn best_start(starts: &AvailabilityGrid) -> Option<usize> {
    let total = starts.len();
    let count = starts.count();
    if count == 0 {
        return None;
    }
    if count == total {
        return Some(0);
    }

    // Begin scanning just after a gap so no run is split by the week boundary.
    let gap = (0..total).find(|&i| !starts.contains(i))?;
    let mut best: Option<(usize, usize)> = None; // (length, min index)
    let mut run_len = 0;
    let mut run_min = usize::MAX;
    for step in 1..=total {
        let index = (gap + step) % total;
        if starts.contains(index) {
            run_len += 1;
            run_min = run_min.min(index);
            continue;
        }
        if run_len > 0 {
            let better = match best {
                None => true,
                Some((len, min)) => run_len > len || (run_len == len && run_min < min),
            };
            if better {
                best = Some((run_len, run_min));
            }
        }
        run_len = 0;
        run_min = usize::MAX;
    }
    best.map(|(_, min)| min)
}
