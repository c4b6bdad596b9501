//! # Notifications
//!
//! `NotificationEmitter` is the best-effort side channel used by the answer
//! flows; `NotificationService` is the recipient's inbox.

use std::sync::Arc;

use domains::{
    Answer, AppError, Notification, NotificationId, NotificationKind, NotificationRepository,
    Question, Result, User, UserId,
};
use tracing::{debug, info, instrument, warn};

use crate::views::{NotificationView, Population};
use crate::Repositories;

#[derive(Clone)]
pub struct NotificationEmitter {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationEmitter {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// Persists a notification for `recipient`.
    ///
    /// Must be called after the triggering mutation is persisted. Self-actions
    /// produce nothing, and a failed insert is logged and swallowed.
    pub async fn emit(
        &self,
        kind: NotificationKind,
        sender: &User,
        recipient: UserId,
        question: &Question,
        answer: &Answer,
    ) -> Option<Notification> {
        let Some(notification) = Notification::compose(kind, sender, recipient, question, answer)
        else {
            debug!(kind = kind.as_str(), user = %sender.id, "self-action; no notification");
            return None;
        };

        match self.repo.insert_notification(&notification).await {
            Ok(()) => {
                debug!(id = %notification.id, kind = kind.as_str(), %recipient, "notification emitted");
                Some(notification)
            }
            Err(err) => {
                warn!(error = %err, kind = kind.as_str(), %recipient, "failed to emit notification");
                None
            }
        }
    }
}

pub struct NotificationService {
    repos: Repositories,
    limit: u32,
}

impl NotificationService {
    pub fn new(repos: Repositories, limit: u32) -> Self {
        Self { repos, limit }
    }

    /// Newest first, with senders and question titles populated.
    #[instrument(skip_all, fields(user = %caller.id))]
    pub async fn list(&self, caller: &User) -> Result<Vec<NotificationView>> {
        let notifications = self
            .repos
            .notifications
            .notifications_for(caller.id, self.limit)
            .await?;
        let population = Population::for_notifications(
            self.repos.users.as_ref(),
            self.repos.questions.as_ref(),
            &notifications,
        )
        .await?;

        Ok(notifications
            .iter()
            .map(|n| population.notification(n))
            .collect())
    }

    /// Marks one notification read. Read is terminal, so repeating is harmless.
    #[instrument(skip_all, fields(notification = %id, user = %caller.id))]
    pub async fn mark_read(&self, id: NotificationId, caller: &User) -> Result<NotificationView> {
        let notification = self
            .repos
            .notifications
            .find_notification(id)
            .await?
            .ok_or(AppError::NotFound("Notification"))?;

        if notification.recipient != caller.id {
            return Err(AppError::unauthorized("Not authorized"));
        }

        let updated = if notification.read {
            notification
        } else {
            self.repos
                .notifications
                .mark_read(id)
                .await?
                .ok_or(AppError::NotFound("Notification"))?
        };

        let population = Population::for_notifications(
            self.repos.users.as_ref(),
            self.repos.questions.as_ref(),
            std::slice::from_ref(&updated),
        )
        .await?;
        Ok(population.notification(&updated))
    }

    #[instrument(skip_all, fields(user = %caller.id))]
    pub async fn mark_all_read(&self, caller: &User) -> Result<u64> {
        let updated = self.repos.notifications.mark_all_read(caller.id).await?;
        info!(updated, "notifications marked read");
        Ok(updated)
    }

    pub async fn unread_count(&self, caller: &User) -> Result<u64> {
        self.repos.notifications.count_unread(caller.id).await
    }
}
