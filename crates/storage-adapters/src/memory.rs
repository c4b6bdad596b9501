//! # MemoryStore
//!
//! DashMap-backed entity store. Used by tests and by the server when no
//! database URL is configured. Each map entry is updated under its shard
//! lock, which gives the same per-document atomicity the SQL store has.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::reputation::apply_delta;
use domains::{
    Answer, AnswerId, AnswerRepository, AppError, Notification, NotificationId,
    NotificationRepository, PageRequest, Question, QuestionFilter, QuestionId, QuestionRepository,
    QuestionSummary, Result, User, UserId, UserRepository, UserSummary,
};
use tracing::debug;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    // unique indexes, claimed before a user is inserted
    usernames: DashMap<String, UserId>,
    emails: DashMap<String, UserId>,
    questions: DashMap<QuestionId, Question>,
    answers: DashMap<AnswerId, Answer>,
    notifications: DashMap<NotificationId, Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors `ON DELETE SET NULL` on the notification references, in a
    /// single pass over the inbox.
    fn detach_notifications(&self, question: Option<QuestionId>, answers: &HashSet<AnswerId>) {
        for mut entry in self.notifications.iter_mut() {
            if question.is_some() && entry.question == question {
                entry.question = None;
            }
            if entry.answer.is_some_and(|a| answers.contains(&a)) {
                entry.answer = None;
            }
        }
    }

    fn user_by_index(&self, index: &DashMap<String, UserId>, key: &str) -> Option<User> {
        let id = *index.get(key)?;
        self.users.get(&id).map(|u| u.value().clone())
    }
}

fn conflict(kind: &str) -> AppError {
    AppError::Conflict(format!("{kind} was modified concurrently, retry the request"))
}

fn user_exists() -> AppError {
    AppError::validation("User already exists")
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => return Err(user_exists()),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                self.usernames.remove_if(&user.username, |_, owner| *owner == user.id);
                return Err(user_exists());
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }

        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.user_by_index(&self.emails, email))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.user_by_index(&self.usernames, username))
    }

    async fn find_summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.summary()))
            .collect())
    }

    async fn adjust_reputation(&self, id: UserId, delta: i32) -> Result<Option<i32>> {
        Ok(self.users.get_mut(&id).map(|mut user| {
            user.reputation = apply_delta(user.reputation, delta);
            user.reputation
        }))
    }
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn insert_question(&self, question: &Question) -> Result<()> {
        self.questions.insert(question.id, question.clone());
        Ok(())
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>> {
        Ok(self.questions.get(&id).map(|q| q.value().clone()))
    }

    async fn find_question_summaries(&self, ids: &[QuestionId]) -> Result<Vec<QuestionSummary>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.questions.get(id).map(|q| q.summary()))
            .collect())
    }

    async fn list_questions(
        &self,
        filter: &QuestionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Question>, u64)> {
        let mut matches: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| filter.matches(q.value()))
            .map(|q| q.value().clone())
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .collect();
        Ok((items, total))
    }

    async fn save_question(&self, question: &Question) -> Result<Question> {
        let mut entry = self
            .questions
            .get_mut(&question.id)
            .ok_or(AppError::NotFound("Question"))?;
        if entry.version != question.version {
            return Err(conflict("Question"));
        }

        let mut stored = question.clone();
        // owned by increment_views and accept_answer
        stored.views = entry.views;
        stored.accepted_answer = entry.accepted_answer;
        stored.version += 1;
        *entry = stored.clone();
        Ok(stored)
    }

    async fn increment_views(&self, id: QuestionId) -> Result<Option<Question>> {
        Ok(self.questions.get_mut(&id).map(|mut q| {
            q.views += 1;
            q.value().clone()
        }))
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool> {
        let removed = self.questions.remove(&id).is_some();
        if removed {
            self.detach_notifications(Some(id), &HashSet::new());
        }
        Ok(removed)
    }
}

#[async_trait]
impl AnswerRepository for MemoryStore {
    async fn insert_answer(&self, answer: &Answer) -> Result<()> {
        if !self.questions.contains_key(&answer.question) {
            return Err(AppError::ReferentialError("Question"));
        }
        self.answers.insert(answer.id, answer.clone());
        Ok(())
    }

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>> {
        Ok(self.answers.get(&id).map(|a| a.value().clone()))
    }

    async fn answers_for_question(&self, question: QuestionId) -> Result<Vec<Answer>> {
        let mut answers: Vec<Answer> = self
            .answers
            .iter()
            .filter(|a| a.question == question)
            .map(|a| a.value().clone())
            .collect();
        answers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(answers)
    }

    async fn save_answer(&self, answer: &Answer) -> Result<Answer> {
        let mut entry = self
            .answers
            .get_mut(&answer.id)
            .ok_or(AppError::NotFound("Answer"))?;
        if entry.version != answer.version {
            return Err(conflict("Answer"));
        }

        let mut stored = answer.clone();
        // owned by accept_answer
        stored.is_accepted = entry.is_accepted;
        stored.version += 1;
        *entry = stored.clone();
        Ok(stored)
    }

    async fn accept_answer(&self, question: QuestionId, answer: AnswerId) -> Result<Option<Answer>> {
        // The question guard serialises accepts on the same question.
        let Some(mut owner) = self.questions.get_mut(&question) else {
            return Ok(None);
        };

        let accepted = match self.answers.get_mut(&answer) {
            Some(mut target) if target.question == question => {
                target.is_accepted = true;
                target.value().clone()
            }
            _ => return Ok(None),
        };

        let mut demoted = 0;
        for mut entry in self.answers.iter_mut() {
            if entry.question == question && entry.is_accepted && entry.id != answer {
                entry.is_accepted = false;
                demoted += 1;
            }
        }
        owner.accepted_answer = Some(answer);
        debug!(%question, %answer, demoted, "answer accepted");
        Ok(Some(accepted))
    }

    async fn delete_answer(&self, id: AnswerId) -> Result<bool> {
        let Some((_, answer)) = self.answers.remove(&id) else {
            return Ok(false);
        };

        if let Some(mut question) = self.questions.get_mut(&answer.question) {
            if question.accepted_answer == Some(id) {
                question.accepted_answer = None;
            }
        }
        self.detach_notifications(None, &HashSet::from([id]));
        Ok(true)
    }

    async fn delete_answers_for_question(&self, question: QuestionId) -> Result<u64> {
        let ids: HashSet<AnswerId> = self
            .answers
            .iter()
            .filter(|a| a.question == question)
            .map(|a| *a.key())
            .collect();

        for id in &ids {
            self.answers.remove(id);
        }
        self.detach_notifications(None, &ids);
        debug!(%question, removed = ids.len(), "answers cascaded");
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn find_notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        Ok(self.notifications.get(&id).map(|n| n.value().clone()))
    }

    async fn notifications_for(&self, recipient: UserId, limit: u32) -> Result<Vec<Notification>> {
        let mut list: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.recipient == recipient)
            .map(|n| n.value().clone())
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        list.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(list)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<Option<Notification>> {
        Ok(self.notifications.get_mut(&id).map(|mut n| {
            n.read = true;
            n.value().clone()
        }))
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64> {
        let mut updated = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.recipient == recipient && !entry.read {
                entry.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn count_unread(&self, recipient: UserId) -> Result<u64> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.recipient == recipient && !n.read)
            .count() as u64)
    }
}
