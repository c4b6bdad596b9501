//! # QuestionService
//!
//! Question CRUD, listing, and voting.

use domains::{
    can_mutate, Action, AppError, PageRequest, Question, QuestionDraft, QuestionFilter,
    QuestionId, QuestionPatch, ReputationEvent, Result, User, VoteTarget, VoteType,
};
use tracing::{info, instrument};

use crate::reputation::ReputationEngine;
use crate::views::{Population, QuestionPage, QuestionView};
use crate::Repositories;

pub struct QuestionService {
    repos: Repositories,
    reputation: ReputationEngine,
    page_size: u32,
}

impl QuestionService {
    pub fn new(repos: Repositories, reputation: ReputationEngine, page_size: u32) -> Self {
        Self {
            repos,
            reputation,
            page_size,
        }
    }

    #[instrument(skip_all, fields(user = %author.id))]
    pub async fn create(&self, author: &User, draft: QuestionDraft) -> Result<QuestionView> {
        let question = Question::new(draft, author.id)?;
        self.repos.questions.insert_question(&question).await?;
        info!(question = %question.id, "question created");

        self.project(&question, None).await
    }

    /// One page of questions, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: QuestionFilter, page: u32) -> Result<QuestionPage> {
        let request = PageRequest::new(page, self.page_size);
        let (questions, total) = self.repos.questions.list_questions(&filter, request).await?;

        let population =
            Population::for_questions(self.repos.users.as_ref(), &questions, &[]).await?;
        Ok(QuestionPage {
            questions: questions
                .iter()
                .map(|q| population.question(q, None))
                .collect(),
            page: request.page,
            pages: request.page_count(total),
        })
    }

    /// Full question with nested answers (highest voted first). Counts a view.
    #[instrument(skip(self))]
    pub async fn get(&self, id: QuestionId) -> Result<QuestionView> {
        let question = self
            .repos
            .questions
            .increment_views(id)
            .await?
            .ok_or(AppError::NotFound("Question"))?;

        let mut answers = self.repos.answers.answers_for_question(id).await?;
        answers.sort_by(|a, b| b.votes.vote_count().cmp(&a.votes.vote_count()));

        self.project(&question, Some(&answers)).await
    }

    #[instrument(skip_all, fields(question = %id, user = %caller.id))]
    pub async fn update(
        &self,
        id: QuestionId,
        caller: &User,
        patch: QuestionPatch,
    ) -> Result<QuestionView> {
        let mut question = self.load(id).await?;
        if !can_mutate(caller, question.user, Action::Update) {
            return Err(AppError::unauthorized("Not authorized to update this question"));
        }

        question.apply_patch(patch);
        let saved = self.repos.questions.save_question(&question).await?;
        info!("question updated");

        self.project(&saved, None).await
    }

    /// Deletes the question and every answer under it.
    #[instrument(skip_all, fields(question = %id, user = %caller.id))]
    pub async fn delete(&self, id: QuestionId, caller: &User) -> Result<()> {
        let question = self.load(id).await?;
        if !can_mutate(caller, question.user, Action::Delete) {
            return Err(AppError::unauthorized("Not authorized to delete this question"));
        }

        let answers = self.repos.answers.delete_answers_for_question(id).await?;
        self.repos.questions.delete_question(id).await?;
        info!(answers, "question removed");
        Ok(())
    }

    /// Toggle-votes on a question. Only a freshly cast vote moves the owner's
    /// reputation. Voting on one's own question is allowed.
    #[instrument(skip_all, fields(question = %id, user = %voter.id, vote = vote.as_str()))]
    pub async fn vote(&self, id: QuestionId, voter: &User, vote: VoteType) -> Result<QuestionView> {
        let mut question = self.load(id).await?;
        let outcome = question.votes.apply(voter.id, vote);
        let saved = self.repos.questions.save_question(&question).await?;
        info!(?outcome, vote_count = saved.votes.vote_count(), "question vote applied");

        if let Some(event) = ReputationEvent::for_vote(VoteTarget::Question, vote, outcome) {
            self.reputation.adjust(saved.user, event).await?;
        }

        self.project(&saved, None).await
    }

    async fn load(&self, id: QuestionId) -> Result<Question> {
        self.repos
            .questions
            .find_question(id)
            .await?
            .ok_or(AppError::NotFound("Question"))
    }

    async fn project(
        &self,
        question: &Question,
        answers: Option<&[domains::Answer]>,
    ) -> Result<QuestionView> {
        let population = Population::for_questions(
            self.repos.users.as_ref(),
            std::slice::from_ref(question),
            answers.unwrap_or_default(),
        )
        .await?;
        Ok(population.question(question, answers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{question_by, repositories, user, Mocks};
    use domains::{Role, UserSummary};
    use mockall::predicate::eq;

    fn service(mocks: Mocks) -> QuestionService {
        let repos = repositories(mocks);
        let reputation = ReputationEngine::new(repos.users.clone());
        QuestionService::new(repos, reputation, 10)
    }

    fn summaries_of(users: &[&User]) -> Vec<UserSummary> {
        users.iter().map(|u| u.summary()).collect()
    }

    #[tokio::test]
    async fn strangers_cannot_update() {
        let owner = user("alice");
        let question = question_by(&owner);
        let id = question.id;

        let mut mocks = Mocks::default();
        mocks
            .questions
            .expect_find_question()
            .with(eq(id))
            .returning(move |_| Ok(Some(question.clone())));
        mocks.questions.expect_save_question().never();

        let err = service(mocks)
            .update(id, &user("mallory"), QuestionPatch::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AppError::unauthorized("Not authorized to update this question")
        );
    }

    #[tokio::test]
    async fn admins_can_delete_and_answers_go_with_the_question() {
        let owner = user("alice");
        let mut admin = user("root");
        admin.role = Role::Admin;
        let question = question_by(&owner);
        let id = question.id;

        let mut mocks = Mocks::default();
        mocks
            .questions
            .expect_find_question()
            .returning(move |_| Ok(Some(question.clone())));
        mocks
            .answers
            .expect_delete_answers_for_question()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(3));
        mocks
            .questions
            .expect_delete_question()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(true));

        tokio_test::assert_ok!(service(mocks).delete(id, &admin).await);
    }

    #[tokio::test]
    async fn fresh_upvote_rewards_the_owner_with_five() {
        let owner = user("alice");
        let voter = user("carol");
        let question = question_by(&owner);
        let id = question.id;
        let owner_id = owner.id;
        let people = summaries_of(&[&owner, &voter]);

        let mut mocks = Mocks::default();
        mocks
            .questions
            .expect_find_question()
            .returning(move |_| Ok(Some(question.clone())));
        mocks
            .questions
            .expect_save_question()
            .times(1)
            .returning(|q| {
                let mut stored = q.clone();
                stored.version += 1;
                Ok(stored)
            });
        mocks
            .users
            .expect_adjust_reputation()
            .with(eq(owner_id), eq(5))
            .times(1)
            .returning(|_, _| Ok(Some(5)));
        mocks
            .users
            .expect_find_summaries()
            .returning(move |_| Ok(people.clone()));

        let view = service(mocks)
            .vote(id, &voter, VoteType::Upvote)
            .await
            .unwrap();
        assert_eq!(view.vote_count, 1);
        assert_eq!(view.upvotes[0].username, "carol");
        assert_eq!(view.user.map(|u| u.username).as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn lost_compare_and_swap_fails_without_touching_reputation() {
        let owner = user("alice");
        let question = question_by(&owner);
        let id = question.id;

        let mut mocks = Mocks::default();
        mocks
            .questions
            .expect_find_question()
            .returning(move |_| Ok(Some(question.clone())));
        mocks
            .questions
            .expect_save_question()
            .returning(|_| Err(AppError::Conflict("question changed concurrently".into())));
        mocks.users.expect_adjust_reputation().never();

        let err = service(mocks)
            .vote(id, &user("carol"), VoteType::Downvote)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn reading_a_missing_question_is_not_found() {
        let mut mocks = Mocks::default();
        mocks.questions.expect_increment_views().returning(|_| Ok(None));
        mocks.answers.expect_answers_for_question().never();

        let err = service(mocks).get(QuestionId::generate()).await.unwrap_err();
        assert_eq!(err, AppError::NotFound("Question"));
    }

    #[tokio::test]
    async fn listing_reports_page_count() {
        let owner = user("alice");
        let page: Vec<Question> = (0..5).map(|_| question_by(&owner)).collect();
        let people = summaries_of(&[&owner]);

        let mut mocks = Mocks::default();
        mocks
            .questions
            .expect_list_questions()
            .withf(|_, request| request.page == 2 && request.per_page == 10)
            .returning(move |_, _| Ok((page.clone(), 15)));
        mocks
            .users
            .expect_find_summaries()
            .times(1)
            .returning(move |_| Ok(people.clone()));
        let result = service(mocks).list(QuestionFilter::default(), 2).await.unwrap();
        assert_eq!(result.questions.len(), 5);
        assert_eq!(result.page, 2);
        assert_eq!(result.pages, 2);
    }
}
