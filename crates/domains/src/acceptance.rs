//! # Acceptance state machine
//!
//! A question is either `NoneAccepted` or `Accepted(answer)`. Only the
//! question owner moves it, and at most one answer is ever accepted.

use crate::error::{AppError, Result};
use crate::models::{Answer, AnswerId, Question, User};
use crate::policy::{can_mutate, Action};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceState {
    NoneAccepted,
    Accepted(AnswerId),
}

impl AcceptanceState {
    pub fn of(question: &Question) -> Self {
        match question.accepted_answer {
            Some(id) => AcceptanceState::Accepted(id),
            None => AcceptanceState::NoneAccepted,
        }
    }
}

/// What an accept call changes, decided before the store is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptancePlan {
    pub target: AnswerId,
    /// Answer the question currently points at, which the accept un-marks
    pub demote: Option<AnswerId>,
}

/// Validates an accept request and works out which answer to demote.
pub fn plan_acceptance(question: &Question, answer: &Answer, caller: &User) -> Result<AcceptancePlan> {
    if !can_mutate(caller, question.user, Action::Accept) {
        return Err(AppError::unauthorized(
            "Only the question owner can accept an answer",
        ));
    }
    if answer.question != question.id {
        return Err(AppError::NotFound("Answer"));
    }

    let demote = match AcceptanceState::of(question) {
        AcceptanceState::Accepted(previous) if previous != answer.id => Some(previous),
        _ => None,
    };

    Ok(AcceptancePlan {
        target: answer.id,
        demote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionDraft, Role, UserId};
    use chrono::Utc;

    fn user() -> User {
        User {
            id: UserId::generate(),
            username: "asker".into(),
            email: "asker@example.com".into(),
            password_hash: String::new(),
            avatar: String::new(),
            role: Role::User,
            reputation: 0,
            created_at: Utc::now(),
        }
    }

    fn question_by(owner: &User) -> Question {
        let draft = QuestionDraft {
            title: "Why?".into(),
            description: "Because.".into(),
            tags: vec![],
        };
        Question::new(draft, owner.id).unwrap()
    }

    #[test]
    fn first_acceptance_demotes_nothing() {
        let owner = user();
        let question = question_by(&owner);
        let answer = Answer::new("42".into(), UserId::generate(), question.id).unwrap();

        let plan = plan_acceptance(&question, &answer, &owner).unwrap();
        assert_eq!(plan.target, answer.id);
        assert_eq!(plan.demote, None);
    }

    #[test]
    fn switching_acceptance_demotes_the_previous_answer() {
        let owner = user();
        let mut question = question_by(&owner);
        let previous = AnswerId::generate();
        question.accepted_answer = Some(previous);
        let answer = Answer::new("better".into(), UserId::generate(), question.id).unwrap();

        let plan = plan_acceptance(&question, &answer, &owner).unwrap();
        assert_eq!(plan.demote, Some(previous));
    }

    #[test]
    fn re_accepting_the_same_answer_demotes_nothing() {
        let owner = user();
        let mut question = question_by(&owner);
        let answer = Answer::new("same".into(), UserId::generate(), question.id).unwrap();
        question.accepted_answer = Some(answer.id);

        let plan = plan_acceptance(&question, &answer, &owner).unwrap();
        assert_eq!(plan.demote, None);
        assert_eq!(AcceptanceState::of(&question), AcceptanceState::Accepted(answer.id));
    }

    #[test]
    fn only_the_question_owner_may_accept() {
        let owner = user();
        let question = question_by(&owner);
        let answer = Answer::new("mine".into(), UserId::generate(), question.id).unwrap();

        let err = plan_acceptance(&question, &answer, &user()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn answers_from_other_questions_are_not_found() {
        let owner = user();
        let question = question_by(&owner);
        let stray = Answer::new("elsewhere".into(), UserId::generate(), question_by(&owner).id).unwrap();

        assert_eq!(
            plan_acceptance(&question, &stray, &owner).unwrap_err(),
            AppError::NotFound("Answer")
        );
    }
}
