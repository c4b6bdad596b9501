//! Data mapping between the PostgreSQL relational model and the domain models.

use chrono::{DateTime, Utc};
use domains::{
    Answer, AppError, Notification, Question, QuestionSummary, Result, User, UserId, UserSummary,
    VoteLedger,
};
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, avatar, role, reputation, created_at";

pub(crate) const QUESTION_COLUMNS: &str = "id, title, description, tags, user_id, views, \
     upvotes, downvotes, accepted_answer, version, created_at, updated_at";

pub(crate) const ANSWER_COLUMNS: &str = "id, content, user_id, question_id, upvotes, downvotes, \
     is_accepted, version, created_at, updated_at";

pub(crate) const NOTIFICATION_COLUMNS: &str =
    "id, recipient, sender, kind, question_id, answer_id, message, read, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub role: String,
    pub reputation: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id.into(),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            avatar: row.avatar,
            role: row.role.parse()?,
            reputation: row.reputation,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SummaryRow {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
}

impl From<SummaryRow> for UserSummary {
    fn from(row: SummaryRow) -> Self {
        UserSummary {
            id: row.id.into(),
            username: row.username,
            avatar: row.avatar,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QuestionSummaryRow {
    pub id: Uuid,
    pub title: String,
}

impl From<QuestionSummaryRow> for QuestionSummary {
    fn from(row: QuestionSummaryRow) -> Self {
        QuestionSummary {
            id: row.id.into(),
            title: row.title,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QuestionRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub user_id: Uuid,
    pub views: i64,
    pub upvotes: Vec<Uuid>,
    pub downvotes: Vec<Uuid>,
    pub accepted_answer: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id.into(),
            title: row.title,
            description: row.description,
            tags: row.tags,
            user: row.user_id.into(),
            views: row.views,
            votes: ledger(row.upvotes, row.downvotes),
            accepted_answer: row.accepted_answer.map(Into::into),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AnswerRow {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub upvotes: Vec<Uuid>,
    pub downvotes: Vec<Uuid>,
    pub is_accepted: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: row.id.into(),
            content: row.content,
            user: row.user_id.into(),
            question: row.question_id.into(),
            votes: ledger(row.upvotes, row.downvotes),
            is_accepted: row.is_accepted,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub recipient: Uuid,
    pub sender: Uuid,
    pub kind: String,
    pub question_id: Option<Uuid>,
    pub answer_id: Option<Uuid>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Notification {
            id: row.id.into(),
            recipient: row.recipient.into(),
            sender: row.sender.into(),
            kind: row.kind.parse()?,
            question: row.question_id.map(Into::into),
            answer: row.answer_id.map(Into::into),
            message: row.message,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

/// The stored `vote_count` column is a sort key only; the ledger recounts.
fn ledger(upvotes: Vec<Uuid>, downvotes: Vec<Uuid>) -> VoteLedger {
    VoteLedger::from_parts(
        upvotes.into_iter().map(UserId::from).collect(),
        downvotes.into_iter().map(UserId::from).collect(),
    )
}

pub(crate) fn uuids(ids: &[UserId]) -> Vec<Uuid> {
    ids.iter().map(UserId::as_uuid).collect()
}
