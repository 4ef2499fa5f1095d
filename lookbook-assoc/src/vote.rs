//! Approve/disapprove bookkeeping for votable entities.
//!
//! Unlike a toggle, a vote names the desired end state: `Add` inserts the
//! voter if absent and `Remove` drops it if present, so replaying a request is
//! harmless.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::set_column::{SetColumn, SetColumnError, normalize_identifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    #[serde(alias = "like", alias = "up")]
    Approve,
    #[serde(alias = "dislike", alias = "down")]
    Disapprove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOp {
    Add,
    Remove,
}

/// `exclusive` makes an `Add` on one side drop the voter from the other side.
/// Off by default: historically a voter could sit in both lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VotePolicy {
    pub exclusive: bool,
}

/// Which of the two lists a vote touched. Only touched lists are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteChange {
    pub approvers: bool,
    pub disapprovers: bool,
}

impl VoteChange {
    pub fn any(self) -> bool {
        self.approvers || self.disapprovers
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteSets {
    pub approvers: SetColumn,
    pub disapprovers: SetColumn,
}

impl VoteSets {
    pub fn new(approvers: SetColumn, disapprovers: SetColumn) -> Self {
        Self {
            approvers,
            disapprovers,
        }
    }

    pub fn apply(
        &mut self,
        voter: impl fmt::Display,
        direction: VoteDirection,
        op: VoteOp,
        policy: VotePolicy,
    ) -> Result<VoteChange, SetColumnError> {
        let voter = normalize_identifier(voter)?;

        let (target, opposite) = match direction {
            VoteDirection::Approve => (&mut self.approvers, &mut self.disapprovers),
            VoteDirection::Disapprove => (&mut self.disapprovers, &mut self.approvers),
        };

        let target_changed = match op {
            VoteOp::Add => target.insert(&voter)?,
            VoteOp::Remove => target.remove(&voter),
        };
        let opposite_changed = policy.exclusive && op == VoteOp::Add && opposite.strip(&voter) > 0;

        Ok(match direction {
            VoteDirection::Approve => VoteChange {
                approvers: target_changed,
                disapprovers: opposite_changed,
            },
            VoteDirection::Disapprove => VoteChange {
                approvers: opposite_changed,
                disapprovers: target_changed,
            },
        })
    }

    pub fn has_approved(&self, voter: impl fmt::Display) -> bool {
        self.approvers.contains(voter)
    }

    pub fn has_disapproved(&self, voter: impl fmt::Display) -> bool {
        self.disapprovers.contains(voter)
    }

    pub fn tally(&self) -> Tally {
        tally(self.approvers.len(), self.disapprovers.len())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// 0..=100, rounded half up.
    pub percentage_approve: u8,
    pub total_votes: usize,
}

/// Approval percentage over all votes, rounded half up (1 of 8 is 13%).
/// No votes is 0%.
pub fn tally(approvals: usize, disapprovals: usize) -> Tally {
    let total_votes = approvals + disapprovals;
    if total_votes == 0 {
        return Tally::default();
    }

    let percentage = (200 * approvals + total_votes) / (2 * total_votes);
    Tally {
        percentage_approve: u8::try_from(percentage).unwrap_or(100),
        total_votes,
    }
}
