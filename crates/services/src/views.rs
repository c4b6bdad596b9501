//! # Response views
//!
//! Read-side projections of the entities. User references are resolved
//! into `UserSummary`s in one batch per response ("population").

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use domains::{
    Answer, AnswerId, Notification, NotificationId, NotificationKind, Question, QuestionId,
    QuestionRepository, QuestionSummary, Result, Role, User, UserId, UserRepository, UserSummary,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// `None` when the owner account no longer exists
    pub user: Option<UserSummary>,
    pub views: i64,
    pub upvotes: Vec<UserSummary>,
    pub downvotes: Vec<UserSummary>,
    pub vote_count: i32,
    pub accepted_answer: Option<AnswerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<AnswerView>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub id: AnswerId,
    pub content: String,
    pub user: Option<UserSummary>,
    pub question: QuestionId,
    pub upvotes: Vec<UserSummary>,
    pub downvotes: Vec<UserSummary>,
    pub vote_count: i32,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: NotificationId,
    pub recipient: UserId,
    pub sender: Option<UserSummary>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// `None` once the question is deleted
    pub question: Option<QuestionSummary>,
    pub answer: Option<AnswerId>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// `GET /questions` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPage {
    pub questions: Vec<QuestionView>,
    pub page: u32,
    pub pages: u64,
}

/// The caller's own account, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub reputation: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
            reputation: user.reputation,
            created_at: user.created_at,
        }
    }
}

/// Resolved user (and, for the inbox, question) summaries for one response.
#[derive(Debug, Default)]
pub(crate) struct Population {
    by_id: HashMap<UserId, UserSummary>,
    questions: HashMap<QuestionId, QuestionSummary>,
}

impl Population {
    pub(crate) async fn resolve(users: &dyn UserRepository, mut ids: Vec<UserId>) -> Result<Self> {
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(Self::default());
        }

        let by_id = users
            .find_summaries(&ids)
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect();
        Ok(Self {
            by_id,
            ..Self::default()
        })
    }

    /// Senders and question titles for a batch of notifications.
    pub(crate) async fn for_notifications(
        users: &dyn UserRepository,
        questions: &dyn QuestionRepository,
        notifications: &[Notification],
    ) -> Result<Self> {
        let senders = notifications.iter().map(|n| n.sender).collect();
        let mut population = Self::resolve(users, senders).await?;

        let mut ids: Vec<QuestionId> = notifications.iter().filter_map(|n| n.question).collect();
        ids.sort_unstable();
        ids.dedup();
        if !ids.is_empty() {
            population.questions = questions
                .find_question_summaries(&ids)
                .await?
                .into_iter()
                .map(|summary| (summary.id, summary))
                .collect();
        }
        Ok(population)
    }

    pub(crate) async fn for_questions(
        users: &dyn UserRepository,
        questions: &[Question],
        answers: &[Answer],
    ) -> Result<Self> {
        let ids = questions
            .iter()
            .flat_map(question_refs)
            .chain(answers.iter().flat_map(answer_refs))
            .collect();
        Self::resolve(users, ids).await
    }

    pub(crate) async fn for_answers(users: &dyn UserRepository, answers: &[Answer]) -> Result<Self> {
        Self::for_questions(users, &[], answers).await
    }

    fn one(&self, id: UserId) -> Option<UserSummary> {
        self.by_id.get(&id).cloned()
    }

    fn many(&self, ids: &[UserId]) -> Vec<UserSummary> {
        ids.iter().filter_map(|id| self.one(*id)).collect()
    }

    pub(crate) fn question(&self, question: &Question, answers: Option<&[Answer]>) -> QuestionView {
        QuestionView {
            id: question.id,
            title: question.title.clone(),
            description: question.description.clone(),
            tags: question.tags.clone(),
            user: self.one(question.user),
            views: question.views,
            upvotes: self.many(question.votes.upvotes()),
            downvotes: self.many(question.votes.downvotes()),
            vote_count: question.votes.vote_count(),
            accepted_answer: question.accepted_answer,
            answers: answers.map(|list| list.iter().map(|a| self.answer(a)).collect()),
            created_at: question.created_at,
            updated_at: question.updated_at,
        }
    }

    pub(crate) fn answer(&self, answer: &Answer) -> AnswerView {
        AnswerView {
            id: answer.id,
            content: answer.content.clone(),
            user: self.one(answer.user),
            question: answer.question,
            upvotes: self.many(answer.votes.upvotes()),
            downvotes: self.many(answer.votes.downvotes()),
            vote_count: answer.votes.vote_count(),
            is_accepted: answer.is_accepted,
            created_at: answer.created_at,
            updated_at: answer.updated_at,
        }
    }

    pub(crate) fn notification(&self, notification: &Notification) -> NotificationView {
        NotificationView {
            id: notification.id,
            recipient: notification.recipient,
            sender: self.one(notification.sender),
            kind: notification.kind,
            question: notification
                .question
                .and_then(|id| self.questions.get(&id).cloned()),
            answer: notification.answer,
            message: notification.message.clone(),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

fn question_refs(question: &Question) -> impl Iterator<Item = UserId> + '_ {
    std::iter::once(question.user)
        .chain(question.votes.upvotes().iter().copied())
        .chain(question.votes.downvotes().iter().copied())
}

fn answer_refs(answer: &Answer) -> impl Iterator<Item = UserId> + '_ {
    std::iter::once(answer.user)
        .chain(answer.votes.upvotes().iter().copied())
        .chain(answer.votes.downvotes().iter().copied())
}
