//! Post-search group size balancing.
//!
//! # Algorithm
//!
//! Repeatedly take the pair (largest, smallest) of placeable groups whose
//! sizes differ by more than one and move the first member of the larger
//! group whose move keeps both groups placeable. Both groups stay
//! placeable, so the total score is unchanged. Stops when no such pair
//! admits a move.
//!
//! Every move strictly lowers the sum of squared group sizes, so the loop
//! terminates.

use crate::scoring::Scorer;
use crate::search::{Location, PartitionState};

/// Evens out group sizes without lowering the total score.
///
/// Non-placeable groups are left untouched. Returns the number of moves.
pub fn balance_groups(state: &mut PartitionState, scorer: &Scorer<'_>) -> usize {
    let mut moves = 0;
    while let Some((member, to)) = find_move(state, scorer) {
        state.move_member(scorer, member, Location::Group(to));
        moves += 1;
    }
    if moves > 0 {
        tracing::debug!(moves, "balanced group sizes");
    }
    moves
}

fn find_move(state: &PartitionState, scorer: &Scorer<'_>) -> Option<(usize, usize)> {
    let mut placeable: Vec<usize> = (0..state.group_count())
        .filter(|&g| state.group(g).contribution() > 0)
        .collect();
    if placeable.len() < 2 {
        return None;
    }
    // Largest first, ties by index.
    placeable.sort_by(|&a, &b| state.group(b).len().cmp(&state.group(a).len()).then(a.cmp(&b)));

    let mut members = Vec::new();
    for &large in &placeable {
        for &small in placeable.iter().rev() {
            if state.group(large).len() <= state.group(small).len() + 1 {
                break;
            }
            for &m in state.group(large).members() {
                members.clear();
                members.extend(state.group(large).members().iter().copied().filter(|&x| x != m));
                if !scorer.is_placeable(&scorer.evaluate_members(&members)) {
                    continue;
                }
                members.clear();
                members.extend_from_slice(state.group(small).members());
                members.push(m);
                if scorer.is_placeable(&scorer.evaluate_members(&members)) {
                    return Some((m, small));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityGrid, Signup, SlotGrid};
    use crate::scoring::ScoringRules;

    fn signup(id: &str, cells: &[usize]) -> Signup {
        Signup::new(id, AvailabilityGrid::from_indices(SlotGrid::default(), cells.iter().copied()))
    }

    fn rules(min: usize, max: usize) -> ScoringRules {
        ScoringRules {
            min_group_size: min,
            max_group_size: max,
            ..ScoringRules::default()
        }
    }

    fn build(state: &mut PartitionState, scorer: &Scorer<'_>, members: &[usize]) -> usize {
        let g = state.open_group(scorer, members[0]);
        for &m in &members[1..] {
            state.move_member(scorer, m, Location::Group(g));
        }
        g
    }

    #[test]
    fn test_balances_sizes() {
        let signups: Vec<Signup> = (0..8).map(|i| signup(&format!("s{i}"), &[4])).collect();
        let scorer = Scorer::new(&signups, rules(2, 6));
        let mut state = PartitionState::all_unplaced(8);
        build(&mut state, &scorer, &[0, 1, 2, 3, 4, 5]);
        build(&mut state, &scorer, &[6, 7]);
        assert_eq!(state.total_score(), 8);

        let moves = balance_groups(&mut state, &scorer);

        assert_eq!(moves, 2);
        assert_eq!(state.total_score(), 8);
        assert!(state.groups().iter().all(|g| g.len() == 4));
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_respects_availability() {
        // Members 0..4 can only meet at cell 1; the small group meets at 2.
        let signups = vec![
            signup("a", &[1]),
            signup("b", &[1]),
            signup("c", &[1]),
            signup("d", &[1]),
            signup("e", &[1, 2]),
            signup("f", &[2]),
            signup("g", &[2]),
        ];
        let scorer = Scorer::new(&signups, rules(2, 5));
        let mut state = PartitionState::all_unplaced(7);
        build(&mut state, &scorer, &[0, 1, 2, 3, 4]);
        build(&mut state, &scorer, &[5, 6]);

        let moves = balance_groups(&mut state, &scorer);

        assert_eq!(moves, 1);
        assert_eq!(state.group_of(4), state.group_of(5));
        assert_eq!(state.total_score(), 7);
    }

    #[test]
    fn test_single_group_untouched() {
        let signups: Vec<Signup> = (0..4).map(|i| signup(&format!("s{i}"), &[4])).collect();
        let scorer = Scorer::new(&signups, rules(2, 4));
        let mut state = PartitionState::all_unplaced(4);
        build(&mut state, &scorer, &[0, 1, 2, 3]);
        assert_eq!(balance_groups(&mut state, &scorer), 0);
    }
}
