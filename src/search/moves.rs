//! Local search neighbourhood.
//!
//! Four move types, drawn uniformly with the run's RNG:
//!
//! | Move | Effect |
//! |------|--------|
//! | `Relocate` | a random signup (unplaced ones favoured) joins another random group, or opens a new one |
//! | `Swap` | two random members of two random groups trade places |
//! | `Merge` | two groups whose combined size fits `max_group_size` combine |
//! | `Split` | a group large enough for two valid halves is split at random; an unplaceable group is dissolved instead |
//!
//! Moves are applied to a scratch copy of the partition; the engine decides
//! whether to commit it.

use rand::Rng;

use super::state::{Location, PartitionState};
use crate::scoring::Scorer;

/// Local move type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Signup → another group.
    Relocate,
    /// Exchange members of two groups.
    Swap,
    /// Combine two groups.
    Merge,
    /// Divide (or dissolve) one group.
    Split,
}

impl MoveKind {
    /// All move kinds.
    pub const ALL: [MoveKind; 4] = [Self::Relocate, Self::Swap, Self::Merge, Self::Split];

    /// Draws a move kind uniformly.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Applies a move of this kind to `state`.
    ///
    /// Returns `false` when the move has no valid target in the current
    /// partition (e.g. `Swap` with fewer than two groups); `state` is then
    /// unchanged.
    pub fn apply<R: Rng>(
        self,
        state: &mut PartitionState,
        scorer: &Scorer<'_>,
        rng: &mut R,
    ) -> bool {
        match self {
            Self::Relocate => relocate(state, scorer, rng),
            Self::Swap => swap(state, scorer, rng),
            Self::Merge => merge(state, scorer, rng),
            Self::Split => split(state, scorer, rng),
        }
    }
}

fn relocate<R: Rng>(state: &mut PartitionState, scorer: &Scorer<'_>, rng: &mut R) -> bool {
    if state.is_empty() {
        return false;
    }
    // Half the draws come from the unplaced list so stragglers get placed.
    let member = if !state.unplaced().is_empty() && rng.random_bool(0.5) {
        state.unplaced()[rng.random_range(0..state.unplaced().len())]
    } else {
        rng.random_range(0..state.len())
    };
    let target = rng.random_range(0..=state.group_count());
    if target == state.group_count() {
        state.open_group(scorer, member);
    } else if state.location(member) == Location::Group(target) {
        return false;
    } else {
        state.move_member(scorer, member, Location::Group(target));
    }
    true
}

fn swap<R: Rng>(state: &mut PartitionState, scorer: &Scorer<'_>, rng: &mut R) -> bool {
    let groups = state.group_count();
    if groups < 2 {
        return false;
    }
    let a = rng.random_range(0..groups);
    let mut b = rng.random_range(0..groups - 1);
    if b >= a {
        b += 1;
    }
    let pick = |g: usize, rng: &mut R| {
        let members = state.group(g).members();
        members[rng.random_range(0..members.len())]
    };
    let member_a = pick(a, rng);
    let member_b = pick(b, rng);
    state.swap(scorer, member_a, member_b)
}

fn merge<R: Rng>(state: &mut PartitionState, scorer: &Scorer<'_>, rng: &mut R) -> bool {
    let max = scorer.rules().max_group_size;
    let groups = state.groups();
    let small: Vec<usize> = (0..groups.len()).filter(|&g| groups[g].len() < max).collect();
    if small.len() < 2 {
        return false;
    }
    let a = small[rng.random_range(0..small.len())];
    let room = max - groups[a].len();
    let partners: Vec<usize> = small
        .iter()
        .copied()
        .filter(|&g| g != a && groups[g].len() <= room)
        .collect();
    if partners.is_empty() {
        return false;
    }
    let b = partners[rng.random_range(0..partners.len())];
    state.merge(scorer, a, b)
}

fn split<R: Rng>(state: &mut PartitionState, scorer: &Scorer<'_>, rng: &mut R) -> bool {
    let min = scorer.rules().min_group_size.max(1);
    let groups = state.groups();
    let eligible: Vec<usize> = (0..groups.len())
        .filter(|&g| groups[g].len() >= 2 * min || groups[g].contribution() == 0)
        .collect();
    if eligible.is_empty() {
        return false;
    }
    let g = eligible[rng.random_range(0..eligible.len())];
    if state.group(g).len() >= 2 * min {
        state.shuffle_group(g, rng);
        state.split(scorer, g)
    } else {
        state.dissolve(g);
        true
    }
}
