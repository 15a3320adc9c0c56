//! Working partition state.
//!
//! Arena + index representation: signups are referred to by their index
//! in the run's signup slice. Every signup has a [`Location`] and a
//! position inside its container, so membership queries and removals are
//! O(1). Each mutation re-scores only the groups it touches and updates
//! `total_score` by delta.
//!
//! Cloning is a flat copy of a few `Vec`s, which is what the search uses
//! for scratch copies and best-seen snapshots.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Partition;
use crate::scoring::{GroupEval, Scorer};

/// Where a signup currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Not in any group.
    Unplaced,
    /// In the group with this index.
    Group(usize),
}

/// A group in the working partition.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingGroup {
    members: Vec<usize>,
    eval: GroupEval,
    contribution: usize,
}

impl WorkingGroup {
    fn empty() -> Self {
        Self {
            members: Vec::new(),
            eval: GroupEval::EMPTY,
            contribution: 0,
        }
    }

    /// Member signup indices, in insertion order.
    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Member count.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Latest evaluation.
    #[inline]
    pub fn eval(&self) -> &GroupEval {
        &self.eval
    }

    /// Score counted towards the partition total.
    #[inline]
    pub fn contribution(&self) -> usize {
        self.contribution
    }
}

/// Mutable partition of signups into groups and an unplaced bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionState {
    groups: Vec<WorkingGroup>,
    unplaced: Vec<usize>,
    location: Vec<Location>,
    position: Vec<usize>,
    total_score: usize,
}

impl PartitionState {
    /// Creates a state with all `n` signups unplaced.
    pub fn all_unplaced(n: usize) -> Self {
        Self {
            groups: Vec::new(),
            unplaced: (0..n).collect(),
            location: vec![Location::Unplaced; n],
            position: (0..n).collect(),
            total_score: 0,
        }
    }

    /// Number of signups tracked.
    #[inline]
    pub fn len(&self) -> usize {
        self.location.len()
    }

    /// Whether no signups are tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.location.is_empty()
    }

    /// Sum of group contributions.
    #[inline]
    pub fn total_score(&self) -> usize {
        self.total_score
    }

    /// All groups.
    #[inline]
    pub fn groups(&self) -> &[WorkingGroup] {
        &self.groups
    }

    /// One group.
    #[inline]
    pub fn group(&self, group: usize) -> &WorkingGroup {
        &self.groups[group]
    }

    /// Number of groups.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Unplaced signup indices.
    #[inline]
    pub fn unplaced(&self) -> &[usize] {
        &self.unplaced
    }

    /// Location of a signup.
    #[inline]
    pub fn location(&self, member: usize) -> Location {
        self.location[member]
    }

    /// Group index of a signup, if placed.
    pub fn group_of(&self, member: usize) -> Option<usize> {
        match self.location[member] {
            Location::Group(g) => Some(g),
            Location::Unplaced => None,
        }
    }

    /// Moves a signup to another group or to unplaced.
    ///
    /// A group pushed past `max_group_size` is split; a group left empty
    /// is removed (group indices after the call may differ).
    pub fn move_member(&mut self, scorer: &Scorer<'_>, member: usize, to: Location) {
        let from = self.location[member];
        if from == to {
            return;
        }
        self.detach(member);
        self.attach(member, to);

        if let Location::Group(g) = to {
            self.refresh(scorer, g);
        }
        if let Location::Group(g) = from {
            self.refresh(scorer, g);
        }
        if let Location::Group(g) = to {
            if self.groups[g].len() > scorer.rules().max_group_size {
                self.split(scorer, g);
            }
        }
        if let Location::Group(g) = from {
            self.remove_if_empty(g);
        }
    }

    /// Moves a signup into a new group of its own. Returns the new group's index.
    pub fn open_group(&mut self, scorer: &Scorer<'_>, member: usize) -> usize {
        let from = self.location[member];
        let new_group = self.groups.len();
        self.groups.push(WorkingGroup::empty());
        self.detach(member);
        self.attach(member, Location::Group(new_group));
        self.refresh(scorer, new_group);
        if let Location::Group(g) = from {
            self.refresh(scorer, g);
            self.remove_if_empty(g);
        }
        self.group_of(member).unwrap_or(new_group)
    }

    /// Exchanges the containers of two signups.
    ///
    /// Returns `false` (no change) if both share a container.
    pub fn swap(&mut self, scorer: &Scorer<'_>, a: usize, b: usize) -> bool {
        let (loc_a, pos_a) = (self.location[a], self.position[a]);
        let (loc_b, pos_b) = (self.location[b], self.position[b]);
        if loc_a == loc_b {
            return false;
        }
        *self.slot_mut(loc_a, pos_a) = b;
        *self.slot_mut(loc_b, pos_b) = a;
        self.location[a] = loc_b;
        self.position[a] = pos_b;
        self.location[b] = loc_a;
        self.position[b] = pos_a;

        for loc in [loc_a, loc_b] {
            if let Location::Group(g) = loc {
                self.refresh(scorer, g);
            }
        }
        true
    }

    /// Merges two groups if the result fits `max_group_size`.
    pub fn merge(&mut self, scorer: &Scorer<'_>, a: usize, b: usize) -> bool {
        if a == b || a >= self.groups.len() || b >= self.groups.len() {
            return false;
        }
        if self.groups[a].len() + self.groups[b].len() > scorer.rules().max_group_size {
            return false;
        }
        let (keep, drop) = (a.min(b), a.max(b));
        let moved = std::mem::take(&mut self.groups[drop].members);
        for member in moved {
            self.location[member] = Location::Group(keep);
            self.position[member] = self.groups[keep].members.len();
            self.groups[keep].members.push(member);
        }
        self.refresh(scorer, keep);
        self.refresh(scorer, drop);
        self.remove_if_empty(drop);
        true
    }

    /// Splits a group in two halves by member order.
    ///
    /// If the group cannot yield two groups of at least `min_group_size`
    /// but exceeds `max_group_size`, the members past the limit become
    /// unplaced instead. Returns `false` if nothing changed.
    pub fn split(&mut self, scorer: &Scorer<'_>, group: usize) -> bool {
        let rules = *scorer.rules();
        let size = self.groups[group].len();

        if size >= 2 * rules.min_group_size.max(1) {
            let tail = self.groups[group].members.split_off(size / 2);
            let new_group = self.groups.len();
            self.groups.push(WorkingGroup::empty());
            for member in tail {
                self.location[member] = Location::Group(new_group);
                self.position[member] = self.groups[new_group].members.len();
                self.groups[new_group].members.push(member);
            }
            self.refresh(scorer, group);
            self.refresh(scorer, new_group);
            // Both halves only ever append groups, so indices stay valid.
            for g in [group, new_group] {
                if self.groups[g].len() > rules.max_group_size {
                    self.split(scorer, g);
                }
            }
            true
        } else if size > rules.max_group_size {
            let overflow = self.groups[group].members.split_off(rules.max_group_size);
            for member in overflow {
                self.attach(member, Location::Unplaced);
            }
            self.refresh(scorer, group);
            true
        } else {
            false
        }
    }

    /// Sends every member of a group to unplaced and removes the group.
    pub fn dissolve(&mut self, group: usize) {
        let members = std::mem::take(&mut self.groups[group].members);
        for member in members {
            self.attach(member, Location::Unplaced);
        }
        self.total_score -= self.groups[group].contribution;
        self.groups[group].eval = GroupEval::EMPTY;
        self.groups[group].contribution = 0;
        self.remove_if_empty(group);
    }

    /// Dissolves every group that is not placeable.
    pub fn dissolve_unplaceable(&mut self) {
        let mut g = 0;
        while g < self.groups.len() {
            if self.groups[g].contribution == 0 {
                self.dissolve(g);
            } else {
                g += 1;
            }
        }
    }

    /// Randomly reorders a group's members (changes how it would split).
    pub fn shuffle_group<R: Rng>(&mut self, group: usize, rng: &mut R) {
        let members = &mut self.groups[group].members;
        members.shuffle(rng);
        for (pos, &member) in members.iter().enumerate() {
            self.position[member] = pos;
        }
    }

    /// ID-level partition containing only placeable groups.
    ///
    /// Members of non-placeable groups are reported as unplaced. Groups are
    /// ordered by their smallest member ID.
    pub fn to_partition(&self, scorer: &Scorer<'_>) -> Partition {
        let signups = scorer.signups();
        let mut groups = Vec::new();
        let mut unplaced: Vec<String> =
            self.unplaced.iter().map(|&m| signups[m].id.clone()).collect();

        for group in &self.groups {
            if scorer.is_placeable(&group.eval) {
                groups.push(scorer.to_candidate(&group.members, &group.eval));
            } else {
                unplaced.extend(group.members.iter().map(|&m| signups[m].id.clone()));
            }
        }
        groups.sort_by(|a, b| a.member_ids.cmp(&b.member_ids));
        unplaced.sort();

        let total_score = groups.iter().map(|g| g.score).sum();
        Partition {
            groups,
            unplaced,
            total_score,
        }
    }

    /// Verifies internal bookkeeping. Intended for tests and debug assertions.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = vec![false; self.len()];
        let mut visit = |member: usize, loc: Location, pos: usize| -> Result<(), String> {
            if member >= seen.len() || seen[member] {
                return Err(format!("signup {member} appears more than once"));
            }
            seen[member] = true;
            if self.location[member] != loc || self.position[member] != pos {
                return Err(format!("signup {member} has stale location"));
            }
            Ok(())
        };
        for (pos, &m) in self.unplaced.iter().enumerate() {
            visit(m, Location::Unplaced, pos)?;
        }
        for (g, group) in self.groups.iter().enumerate() {
            if group.is_empty() {
                return Err(format!("group {g} is empty"));
            }
            for (pos, &m) in group.members.iter().enumerate() {
                visit(m, Location::Group(g), pos)?;
            }
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(format!("signup {missing} is missing"));
        }
        let sum: usize = self.groups.iter().map(|g| g.contribution).sum();
        if sum != self.total_score {
            return Err(format!("total score {} != sum {}", self.total_score, sum));
        }
        Ok(())
    }

    fn refresh(&mut self, scorer: &Scorer<'_>, group: usize) {
        let eval = scorer.evaluate_members(&self.groups[group].members);
        let contribution = scorer.contribution(&eval);
        let g = &mut self.groups[group];
        self.total_score = self.total_score - g.contribution + contribution;
        g.eval = eval;
        g.contribution = contribution;
    }

    fn detach(&mut self, member: usize) {
        let pos = self.position[member];
        let container = match self.location[member] {
            Location::Unplaced => &mut self.unplaced,
            Location::Group(g) => &mut self.groups[g].members,
        };
        container.swap_remove(pos);
        if let Some(&moved) = container.get(pos) {
            self.position[moved] = pos;
        }
    }

    fn attach(&mut self, member: usize, to: Location) {
        let container = match to {
            Location::Unplaced => &mut self.unplaced,
            Location::Group(g) => &mut self.groups[g].members,
        };
        self.position[member] = container.len();
        container.push(member);
        self.location[member] = to;
    }

    fn slot_mut(&mut self, loc: Location, pos: usize) -> &mut usize {
        match loc {
            Location::Unplaced => &mut self.unplaced[pos],
            Location::Group(g) => &mut self.groups[g].members[pos],
        }
    }

    fn remove_if_empty(&mut self, group: usize) {
        if !self.groups[group].is_empty() {
            return;
        }
        self.total_score -= self.groups[group].contribution;
        self.groups.swap_remove(group);
        if let Some(moved) = self.groups.get(group) {
            for &member in &moved.members {
                self.location[member] = Location::Group(group);
            }
        }
    }
}
