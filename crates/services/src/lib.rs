//! # services
//!
//! Use-case orchestration for StackIt. Each service authorizes the caller,
//! mutates entities through the ports, applies reputation changes, emits
//! notifications, and returns views with user references populated.

pub mod accounts;
pub mod answers;
pub mod notifications;
pub mod questions;
pub mod reputation;
pub mod views;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use domains::{AnswerRepository, AuthProvider, NotificationRepository, QuestionRepository, UserRepository};

pub use accounts::{AccountService, Credentials, Registration, Session};
pub use answers::AnswerService;
pub use notifications::{NotificationEmitter, NotificationService};
pub use questions::QuestionService;
pub use reputation::ReputationEngine;
pub use views::*;

/// The entity store, split into its ports.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    /// Wires every port to one store implementation.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + QuestionRepository + AnswerRepository + NotificationRepository + 'static,
    {
        Self {
            users: store.clone(),
            questions: store.clone(),
            answers: store.clone(),
            notifications: store,
        }
    }
}

/// Tunables that shape listing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForumLimits {
    pub page_size: u32,
    pub notification_limit: u32,
}

impl Default for ForumLimits {
    fn default() -> Self {
        Self {
            page_size: 10,
            notification_limit: 50,
        }
    }
}

/// Every service, built over one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub questions: Arc<QuestionService>,
    pub answers: Arc<AnswerService>,
    pub notifications: Arc<NotificationService>,
    pub accounts: Arc<AccountService>,
}

impl Services {
    pub fn new(repos: Repositories, auth: Arc<dyn AuthProvider>, limits: ForumLimits) -> Self {
        let reputation = ReputationEngine::new(repos.users.clone());
        let emitter = NotificationEmitter::new(repos.notifications.clone());

        Self {
            questions: Arc::new(QuestionService::new(
                repos.clone(),
                reputation.clone(),
                limits.page_size,
            )),
            answers: Arc::new(AnswerService::new(repos.clone(), reputation, emitter)),
            notifications: Arc::new(NotificationService::new(
                repos.clone(),
                limits.notification_limit,
            )),
            accounts: Arc::new(AccountService::new(repos.users, auth)),
        }
    }
}
