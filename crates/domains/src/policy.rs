//! # Mutation policy
//!
//! The one place that decides whether a caller may change an entity.

use crate::models::{User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update,
    Delete,
    /// Accepting an answer; `owner` is the question owner.
    Accept,
}

/// Owners may update, delete, and accept; admins may additionally delete.
pub fn can_mutate(actor: &User, owner: UserId, action: Action) -> bool {
    match action {
        Action::Update | Action::Accept => actor.id == owner,
        Action::Delete => actor.id == owner || actor.is_admin(),
    }
}
