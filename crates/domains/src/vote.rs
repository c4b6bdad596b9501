//! # Vote Ledger
//!
//! Tracks which users upvoted or downvoted a question or answer and keeps
//! the net score cached next to the membership sets.
//!
//! ## Invariants
//! - A voter is in at most one of `upvotes` / `downvotes`.
//! - `vote_count == upvotes.len() - downvotes.len()` after every mutation.
//!   The sets are authoritative; the count is recomputed, never trusted.

use serde::{Deserialize, Serialize};

use crate::models::UserId;

/// Direction of a vote as sent by clients (`"upvote"` / `"downvote"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
        }
    }
}

/// What a single `apply` did to the voter's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The voter held no vote on this entity; this one is new.
    Cast,
    /// The voter moved from the opposite set.
    Switched,
    /// The voter repeated their vote, which removes it.
    Retracted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    upvotes: Vec<UserId>,
    downvotes: Vec<UserId>,
    vote_count: i32,
}

impl VoteLedger {
    /// Rebuilds a ledger from stored membership lists.
    ///
    /// A voter listed in both sets (which a racing legacy writer could leave
    /// behind) is kept as an upvoter only, and duplicates are dropped.
    pub fn from_parts(upvotes: Vec<UserId>, downvotes: Vec<UserId>) -> Self {
        let mut ledger = Self::default();
        for id in upvotes {
            if !ledger.upvotes.contains(&id) {
                ledger.upvotes.push(id);
            }
        }
        for id in downvotes {
            if !ledger.upvotes.contains(&id) && !ledger.downvotes.contains(&id) {
                ledger.downvotes.push(id);
            }
        }
        ledger.recount();
        ledger
    }

    pub fn upvotes(&self) -> &[UserId] {
        &self.upvotes
    }

    pub fn downvotes(&self) -> &[UserId] {
        &self.downvotes
    }

    pub fn vote_count(&self) -> i32 {
        self.vote_count
    }

    /// Current vote of `voter`, if any.
    pub fn vote_of(&self, voter: UserId) -> Option<VoteType> {
        if self.upvotes.contains(&voter) {
            Some(VoteType::Upvote)
        } else if self.downvotes.contains(&voter) {
            Some(VoteType::Downvote)
        } else {
            None
        }
    }

    /// Applies a vote with toggle semantics and recomputes the cached count.
    pub fn apply(&mut self, voter: UserId, vote: VoteType) -> VoteOutcome {
        let (same, opposite) = match vote {
            VoteType::Upvote => (&mut self.upvotes, &mut self.downvotes),
            VoteType::Downvote => (&mut self.downvotes, &mut self.upvotes),
        };

        let had_opposite = remove(opposite, voter);
        let outcome = if remove(same, voter) {
            VoteOutcome::Retracted
        } else {
            same.push(voter);
            if had_opposite {
                VoteOutcome::Switched
            } else {
                VoteOutcome::Cast
            }
        };

        self.recount();
        outcome
    }

    fn recount(&mut self) {
        let up = i32::try_from(self.upvotes.len()).unwrap_or(i32::MAX);
        let down = i32::try_from(self.downvotes.len()).unwrap_or(i32::MAX);
        self.vote_count = up - down;
    }
}

fn remove(set: &mut Vec<UserId>, voter: UserId) -> bool {
    let before = set.len();
    set.retain(|id| *id != voter);
    set.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voters(n: usize) -> Vec<UserId> {
        (0..n).map(|_| UserId::generate()).collect()
    }

    #[test]
    fn repeating_a_vote_toggles_it_off() {
        let others = voters(3);
        let mut ledger = VoteLedger::from_parts(others[..2].to_vec(), others[2..].to_vec());
        let before = ledger.vote_count();
        let voter = UserId::generate();

        assert_eq!(ledger.apply(voter, VoteType::Upvote), VoteOutcome::Cast);
        assert_eq!(ledger.vote_count(), before + 1);
        assert_eq!(ledger.apply(voter, VoteType::Upvote), VoteOutcome::Retracted);

        assert_eq!(ledger.vote_of(voter), None);
        assert_eq!(ledger.vote_count(), before);
    }

    #[test]
    fn switching_moves_the_voter_between_sets() {
        let mut ledger = VoteLedger::default();
        let voter = UserId::generate();

        ledger.apply(voter, VoteType::Upvote);
        assert_eq!(ledger.apply(voter, VoteType::Downvote), VoteOutcome::Switched);

        assert!(!ledger.upvotes().contains(&voter));
        assert_eq!(ledger.downvotes(), &[voter]);
        assert_eq!(ledger.vote_count(), -1);
    }

    #[test]
    fn downvote_toggle_is_symmetric() {
        let mut ledger = VoteLedger::default();
        let voter = UserId::generate();

        assert_eq!(ledger.apply(voter, VoteType::Downvote), VoteOutcome::Cast);
        assert_eq!(ledger.apply(voter, VoteType::Upvote), VoteOutcome::Switched);
        assert_eq!(ledger.apply(voter, VoteType::Upvote), VoteOutcome::Retracted);
        assert_eq!(ledger.vote_count(), 0);
        assert!(ledger.upvotes().is_empty() && ledger.downvotes().is_empty());
    }

    #[test]
    fn from_parts_repairs_overlapping_membership() {
        let ids = voters(2);
        let ledger = VoteLedger::from_parts(
            vec![ids[0], ids[0]],
            vec![ids[0], ids[1]],
        );

        assert_eq!(ledger.upvotes(), &[ids[0]]);
        assert_eq!(ledger.downvotes(), &[ids[1]]);
        assert_eq!(ledger.vote_count(), 0);
    }

    #[test]
    fn vote_type_uses_wire_names() {
        let parsed: VoteType = serde_json::from_str("\"downvote\"").unwrap();
        assert_eq!(parsed, VoteType::Downvote);
        assert_eq!(VoteType::Upvote.as_str(), "upvote");
    }
}
