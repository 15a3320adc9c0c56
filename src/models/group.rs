//! Candidate group (cohort) model.

use serde::{Deserialize, Serialize};

use super::Cell;

/// An evaluated set of signups.
///
/// Always derived from its membership by the scorer; never edited
/// independently of `member_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateGroup {
    /// Member signup IDs, sorted.
    pub member_ids: Vec<String>,
    /// Chosen recurring meeting start cell (UTC). `None` = no shared time.
    pub meeting_slot: Option<Cell>,
    /// Member count if a meeting slot exists, else 0.
    pub score: usize,
    /// Number of start cells every member can attend.
    pub shared_cells: usize,
    /// Whether the meeting slot relies on someone's if-needed time.
    pub uses_if_needed: bool,
}

impl CandidateGroup {
    /// Number of members.
    #[inline]
    pub fn size(&self) -> usize {
        self.member_ids.len()
    }

    /// Whether the group has a common meeting time.
    #[inline]
    pub fn is_viable(&self) -> bool {
        self.meeting_slot.is_some()
    }

    /// Whether a member belongs to this group.
    pub fn contains(&self, id: &str) -> bool {
        self.member_ids.binary_search_by(|m| m.as_str().cmp(id)).is_ok()
    }
}
