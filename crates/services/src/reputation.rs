//! Reputation Engine: applies `ReputationEvent` deltas to account owners.

use std::sync::Arc;

use domains::{ReputationEvent, Result, UserId, UserRepository};
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct ReputationEngine {
    users: Arc<dyn UserRepository>,
}

impl ReputationEngine {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Applies the event's delta, floored at zero, and returns the new
    /// reputation. A missing owner is skipped rather than failing the caller.
    #[instrument(skip(self))]
    pub async fn adjust(&self, user: UserId, event: ReputationEvent) -> Result<Option<i32>> {
        let updated = self.users.adjust_reputation(user, event.delta()).await?;
        match updated {
            Some(reputation) => debug!(%user, reputation, "reputation adjusted"),
            None => warn!(%user, "reputation owner no longer exists; skipped"),
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockUserRepository;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn passes_the_event_delta_to_the_store() {
        let user = UserId::generate();
        let mut users = MockUserRepository::new();
        users
            .expect_adjust_reputation()
            .with(eq(user), eq(15))
            .times(1)
            .returning(|_, _| Ok(Some(15)));

        let engine = ReputationEngine::new(Arc::new(users));
        let rep = engine.adjust(user, ReputationEvent::AnswerAccepted).await.unwrap();
        assert_eq!(rep, Some(15));
    }

    #[tokio::test]
    async fn missing_owner_is_not_an_error() {
        let mut users = MockUserRepository::new();
        users.expect_adjust_reputation().returning(|_, _| Ok(None));

        let engine = ReputationEngine::new(Arc::new(users));
        let rep = tokio_test::assert_ok!(
            engine
                .adjust(UserId::generate(), ReputationEvent::Downvoted)
                .await
        );
        assert_eq!(rep, None);
    }
}
