//! Greedy initial partition.
//!
//! # Algorithm
//!
//! 1. Shuffle the seed candidates (signups with any availability; only
//!    facilitators when a facilitator is required).
//! 2. For each seed still unplaced, grow a group: repeatedly add the
//!    unplaced signup that keeps the most shared meeting start cells,
//!    ties to the lowest index. Stop at `max_group_size` or when no
//!    addition leaves a shared start cell.
//! 3. Commit the group if it reached `min_group_size`; otherwise its
//!    members stay unplaced for later seeds.
//!
//! Every added member keeps the group's score growing by one, so
//! "most increases the score" reduces to "keeps the group most flexible".
//!
//! # Complexity
//! O(s · k · n · W) where s = seeds, k = max group size, n = signups,
//! W = grid words.

use rand::seq::SliceRandom;
use rand::Rng;

use super::state::{Location, PartitionState};
use crate::models::AvailabilityGrid;
use crate::scoring::Scorer;

/// Builds the starting partition.
pub fn greedy_partition<R: Rng>(scorer: &Scorer<'_>, rng: &mut R) -> PartitionState {
    let signups = scorer.signups();
    let rules = *scorer.rules();
    let mut state = PartitionState::all_unplaced(signups.len());

    let mut seeds: Vec<usize> = (0..signups.len())
        .filter(|&i| !scorer.relaxed_grid(i).is_empty())
        .filter(|&i| !rules.require_facilitator || signups[i].is_facilitator)
        .collect();
    seeds.shuffle(rng);

    let mut candidate = AvailabilityGrid::empty(scorer.shape());
    for seed in seeds {
        if state.location(seed) != Location::Unplaced {
            continue;
        }
        let mut members = vec![seed];
        let mut shared = scorer.relaxed_grid(seed).clone();

        while members.len() < rules.max_group_size {
            let mut best: Option<(usize, usize)> = None; // (flexibility, index)
            for &c in state.unplaced() {
                if members.contains(&c)
                    || (rules.require_facilitator && signups[c].is_facilitator)
                {
                    continue;
                }
                candidate.clone_from(&shared);
                candidate.intersect_with(scorer.relaxed_grid(c));
                let flexibility = scorer.starts(&candidate).count();
                if flexibility == 0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((f, i)) => flexibility > f || (flexibility == f && c < i),
                };
                if better {
                    best = Some((flexibility, c));
                }
            }
            let Some((_, next)) = best else {
                break;
            };
            shared.intersect_with(scorer.relaxed_grid(next));
            members.push(next);
        }

        if members.len() >= rules.min_group_size && !scorer.starts(&shared).is_empty() {
            let group = state.open_group(scorer, members[0]);
            for &m in &members[1..] {
                state.move_member(scorer, m, Location::Group(group));
            }
        }
    }

    tracing::debug!(
        groups = state.group_count(),
        unplaced = state.unplaced().len(),
        score = state.total_score(),
        "greedy construction finished"
    );
    state
}
