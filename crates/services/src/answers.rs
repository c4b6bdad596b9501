//! # AnswerService
//!
//! Answer CRUD, voting, and the acceptance flow.

use std::cmp::Ordering;

use domains::{
    can_mutate, plan_acceptance, Action, Answer, AnswerId, AppError, NotificationKind, QuestionId,
    ReputationEvent, Result, User, VoteTarget, VoteType,
};
use tracing::{info, instrument};

use crate::notifications::NotificationEmitter;
use crate::reputation::ReputationEngine;
use crate::views::{AnswerView, Population};
use crate::Repositories;

pub struct AnswerService {
    repos: Repositories,
    reputation: ReputationEngine,
    emitter: NotificationEmitter,
}

impl AnswerService {
    pub fn new(repos: Repositories, reputation: ReputationEngine, emitter: NotificationEmitter) -> Self {
        Self {
            repos,
            reputation,
            emitter,
        }
    }

    /// Posts an answer and tells the question owner about it.
    #[instrument(skip_all, fields(question = %question_id, user = %author.id))]
    pub async fn create(
        &self,
        question_id: QuestionId,
        author: &User,
        content: String,
    ) -> Result<AnswerView> {
        let question = self
            .repos
            .questions
            .find_question(question_id)
            .await?
            .ok_or(AppError::ReferentialError("Question"))?;

        let answer = Answer::new(content, author.id, question.id)?;
        self.repos.answers.insert_answer(&answer).await?;
        info!(answer = %answer.id, "answer created");

        self.emitter
            .emit(NotificationKind::Answer, author, question.user, &question, &answer)
            .await;

        self.project(&answer).await
    }

    /// Accepted first, then highest voted, then newest.
    #[instrument(skip(self))]
    pub async fn list(&self, question_id: QuestionId) -> Result<Vec<AnswerView>> {
        self.repos
            .questions
            .find_question(question_id)
            .await?
            .ok_or(AppError::NotFound("Question"))?;

        let mut answers = self.repos.answers.answers_for_question(question_id).await?;
        answers.sort_by(rank);

        let population = Population::for_answers(self.repos.users.as_ref(), &answers).await?;
        Ok(answers.iter().map(|a| population.answer(a)).collect())
    }

    #[instrument(skip_all, fields(answer = %id, user = %caller.id))]
    pub async fn update(&self, id: AnswerId, caller: &User, content: Option<String>) -> Result<AnswerView> {
        let mut answer = self.load(id).await?;
        if !can_mutate(caller, answer.user, Action::Update) {
            return Err(AppError::unauthorized("Not authorized to update this answer"));
        }

        answer.apply_patch(content);
        let saved = self.repos.answers.save_answer(&answer).await?;
        info!("answer updated");

        self.project(&saved).await
    }

    /// Deletes an answer. The store clears the question's
    /// `accepted_answer` if it named this one.
    #[instrument(skip_all, fields(answer = %id, user = %caller.id))]
    pub async fn delete(&self, id: AnswerId, caller: &User) -> Result<()> {
        let answer = self.load(id).await?;
        if !can_mutate(caller, answer.user, Action::Delete) {
            return Err(AppError::unauthorized("Not authorized to delete this answer"));
        }

        self.repos.answers.delete_answer(id).await?;
        info!("answer removed");
        Ok(())
    }

    /// Toggle-votes on an answer. Only a freshly cast vote moves the owner's
    /// reputation. Voting on one's own answer is allowed.
    #[instrument(skip_all, fields(answer = %id, user = %voter.id, vote = vote.as_str()))]
    pub async fn vote(&self, id: AnswerId, voter: &User, vote: VoteType) -> Result<AnswerView> {
        let mut answer = self.load(id).await?;
        let outcome = answer.votes.apply(voter.id, vote);
        let saved = self.repos.answers.save_answer(&answer).await?;
        info!(?outcome, vote_count = saved.votes.vote_count(), "answer vote applied");

        if let Some(event) = ReputationEvent::for_vote(VoteTarget::Answer, vote, outcome) {
            self.reputation.adjust(saved.user, event).await?;
        }

        self.project(&saved).await
    }

    /// Marks `id` as the accepted answer of its question.
    ///
    /// The store flips every acceptance flag in one atomic step, so any other
    /// accepted answer of the question is demoted. Grants the answer owner +15
    /// on every call (re-accepting included) and notifies them unless they
    /// are the caller.
    #[instrument(skip_all, fields(answer = %id, user = %caller.id))]
    pub async fn accept(&self, id: AnswerId, caller: &User) -> Result<AnswerView> {
        let answer = self.load(id).await?;
        let question = self
            .repos
            .questions
            .find_question(answer.question)
            .await?
            .ok_or(AppError::NotFound("Question"))?;

        let plan = plan_acceptance(&question, &answer, caller)?;

        let answer = self
            .repos
            .answers
            .accept_answer(question.id, plan.target)
            .await?
            .ok_or(AppError::NotFound("Answer"))?;
        if let Some(previous) = plan.demote {
            info!(previous = %previous, "previous answer un-accepted");
        }
        info!(question = %question.id, "answer accepted");

        self.reputation
            .adjust(answer.user, ReputationEvent::AnswerAccepted)
            .await?;

        self.emitter
            .emit(NotificationKind::Accept, caller, answer.user, &question, &answer)
            .await;

        self.project(&answer).await
    }

    async fn load(&self, id: AnswerId) -> Result<Answer> {
        self.repos
            .answers
            .find_answer(id)
            .await?
            .ok_or(AppError::NotFound("Answer"))
    }

    async fn project(&self, answer: &Answer) -> Result<AnswerView> {
        let population =
            Population::for_answers(self.repos.users.as_ref(), std::slice::from_ref(answer)).await?;
        Ok(population.answer(answer))
    }
}

fn rank(a: &Answer, b: &Answer) -> Ordering {
    b.is_accepted
        .cmp(&a.is_accepted)
        .then_with(|| b.votes.vote_count().cmp(&a.votes.vote_count()))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}
