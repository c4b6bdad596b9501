//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.
//! Stores return `AppError::Internal` for backend failures and
//! `AppError::Conflict` when a compare-and-swap save loses a race.
//!
//! `version` only guards the fields `save_*` writes. Views and acceptance
//! have their own atomic operations and are never written by a save, so
//! a concurrent vote can neither clobber them nor be refused because of them.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Answer, AnswerId, Notification, NotificationId, PageRequest, Question, QuestionFilter,
    QuestionId, QuestionSummary, User, UserId, UserSummary,
};

/// Account persistence, including the atomic reputation counter.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `ValidationError` when the username or email is taken.
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Batch lookup for population; unknown ids are skipped.
    async fn find_summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>>;
    /// Atomically applies `max(0, reputation + delta)`.
    /// Returns the new value, or `None` if the user does not exist.
    async fn adjust_reputation(&self, id: UserId, delta: i32) -> Result<Option<i32>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn insert_question(&self, question: &Question) -> Result<()>;
    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>>;
    /// Batch title lookup for the inbox; unknown ids are skipped.
    async fn find_question_summaries(&self, ids: &[QuestionId]) -> Result<Vec<QuestionSummary>>;
    /// Newest first. Returns the page and the total number of matches.
    async fn list_questions(
        &self,
        filter: &QuestionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Question>, u64)>;
    /// Compare-and-swap on `question.version`; returns the stored copy
    /// with its bumped version. Keeps the stored `views` and
    /// `accepted_answer`.
    async fn save_question(&self, question: &Question) -> Result<Question>;
    /// Atomic `views += 1`; returns the updated question if it exists.
    async fn increment_views(&self, id: QuestionId) -> Result<Option<Question>>;
    async fn delete_question(&self, id: QuestionId) -> Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    async fn insert_answer(&self, answer: &Answer) -> Result<()>;
    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>>;
    /// Oldest first; callers apply their own ordering.
    async fn answers_for_question(&self, question: QuestionId) -> Result<Vec<Answer>>;
    /// Compare-and-swap on `answer.version`. Keeps the stored `is_accepted`.
    async fn save_answer(&self, answer: &Answer) -> Result<Answer>;
    /// Marks `answer` accepted, un-marks every other answer of `question`
    /// and points the question at it, as one atomic step. Returns `None`
    /// (and changes nothing) if either side no longer exists.
    async fn accept_answer(&self, question: QuestionId, answer: AnswerId) -> Result<Option<Answer>>;
    /// Also clears the question's `accepted_answer` when it named this answer.
    async fn delete_answer(&self, id: AnswerId) -> Result<bool>;
    /// Removes every answer of a question; returns how many went.
    async fn delete_answers_for_question(&self, question: QuestionId) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;
    async fn find_notification(&self, id: NotificationId) -> Result<Option<Notification>>;
    /// Newest first, at most `limit` entries.
    async fn notifications_for(&self, recipient: UserId, limit: u32) -> Result<Vec<Notification>>;
    /// Sets `read = true`; returns the updated notification if it exists.
    async fn mark_read(&self, id: NotificationId) -> Result<Option<Notification>>;
    async fn mark_all_read(&self, recipient: UserId) -> Result<u64>;
    async fn count_unread(&self, recipient: UserId) -> Result<u64>;
}

/// Credential and identity contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Produces a salted password hash suitable for storage.
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Verifies a password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a bearer token for `user`.
    fn issue_token(&self, user: UserId) -> Result<String>;

    /// Resolves a bearer token to the user it was issued for.
    /// Fails with `Unauthorized` for malformed, forged, or expired tokens.
    fn verify_token(&self, token: &str) -> Result<UserId>;
}
