//! # Domain Models
//!
//! These structs represent the core entities of StackIt.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::vote::VoteLedger;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(UserId);
entity_id!(QuestionId);
entity_id!(AnswerId);
entity_id!(NotificationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Internal(format!("unknown role {other}"))),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string produced by the `AuthProvider`
    pub password_hash: String,
    pub avatar: String,
    pub role: Role,
    /// Never negative; see `reputation::apply_delta`
    pub reputation: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// The embedded form of a user reference in responses ("population").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub avatar: String,
}

/// A question reference as embedded in the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: QuestionId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Owner; immutable after creation
    pub user: UserId,
    pub views: i64,
    pub votes: VoteLedger,
    pub accepted_answer: Option<AnswerId>,
    /// Compare-and-swap token bumped by the store on every save
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    pub fn summary(&self) -> QuestionSummary {
        QuestionSummary {
            id: self.id,
            title: self.title.clone(),
        }
    }

    pub fn new(draft: QuestionDraft, owner: UserId) -> Result<Self> {
        let title = required(draft.title, "Please add a title")?;
        let description = required(draft.description, "Please add a description")?;
        let now = Utc::now();
        Ok(Self {
            id: QuestionId::generate(),
            title,
            description,
            tags: normalize_tags(draft.tags),
            user: owner,
            views: 0,
            votes: VoteLedger::default(),
            accepted_answer: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Blank title/description keep the current value; `tags` replaces when present.
    pub fn apply_patch(&mut self, patch: QuestionPatch) {
        if let Some(title) = non_blank(patch.title) {
            self.title = title;
        }
        if let Some(description) = non_blank(patch.description) {
            self.description = description;
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub id: AnswerId,
    pub content: String,
    pub user: UserId,
    pub question: QuestionId,
    pub votes: VoteLedger,
    pub is_accepted: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(content: String, owner: UserId, question: QuestionId) -> Result<Self> {
        let content = required(content, "Please add some content")?;
        let now = Utc::now();
        Ok(Self {
            id: AnswerId::generate(),
            content,
            user: owner,
            question,
            votes: VoteLedger::default(),
            is_accepted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, content: Option<String>) {
        if let Some(content) = non_blank(content) {
            self.content = content;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Answer,
    Accept,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Answer => "answer",
            NotificationKind::Accept => "accept",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "answer" => Ok(NotificationKind::Answer),
            "accept" => Ok(NotificationKind::Accept),
            other => Err(AppError::Internal(format!("unknown notification type {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub sender: UserId,
    pub kind: NotificationKind,
    pub question: Option<QuestionId>,
    pub answer: Option<AnswerId>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for `POST /questions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for `PUT /questions/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// Case-insensitive substring of the title
    pub keyword: Option<String>,
    /// Exact tag membership
    pub tag: Option<String>,
}

impl QuestionFilter {
    pub fn matches(&self, question: &Question) -> bool {
        let keyword_ok = self.keyword.as_deref().map_or(true, |kw| {
            question.title.to_lowercase().contains(&kw.to_lowercase())
        });
        let tag_ok = self
            .tag
            .as_deref()
            .map_or(true, |tag| question.tags.iter().any(|t| t == tag));
        keyword_ok && tag_ok
    }
}

/// 1-based page request with a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    /// `ceil(total / per_page)`
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.per_page))
    }
}

fn required(value: String, message: &str) -> Result<String> {
    non_blank(Some(value)).ok_or_else(|| AppError::validation(message))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims, drops blanks, and de-duplicates while keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
