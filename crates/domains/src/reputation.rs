//! # Reputation deltas
//!
//! Fixed reputation changes triggered by votes and acceptance.
//! Reputation is tracked independently of vote counts: it is never
//! recomputed from ledgers, and only a freshly cast vote earns a delta.

use crate::vote::{VoteOutcome, VoteType};

/// What kind of entity a vote landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Question,
    Answer,
}

impl VoteTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteTarget::Question => "question",
            VoteTarget::Answer => "answer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReputationEvent {
    QuestionUpvoted,
    AnswerUpvoted,
    Downvoted,
    AnswerAccepted,
}

impl ReputationEvent {
    pub const fn delta(self) -> i32 {
        match self {
            ReputationEvent::QuestionUpvoted => 5,
            ReputationEvent::AnswerUpvoted => 10,
            ReputationEvent::Downvoted => -2,
            ReputationEvent::AnswerAccepted => 15,
        }
    }

    /// The event a vote produces for the entity owner, if any.
    ///
    /// Switching or retracting a vote never refunds or re-charges anything.
    pub fn for_vote(target: VoteTarget, vote: VoteType, outcome: VoteOutcome) -> Option<Self> {
        if outcome != VoteOutcome::Cast {
            return None;
        }
        Some(match (target, vote) {
            (VoteTarget::Question, VoteType::Upvote) => ReputationEvent::QuestionUpvoted,
            (VoteTarget::Answer, VoteType::Upvote) => ReputationEvent::AnswerUpvoted,
            (_, VoteType::Downvote) => ReputationEvent::Downvoted,
        })
    }
}

/// `max(0, current + delta)`
pub fn apply_delta(current: i32, delta: i32) -> i32 {
    current.saturating_add(delta).max(0)
}
