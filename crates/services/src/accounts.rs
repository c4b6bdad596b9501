//! # AccountService
//!
//! Registration, login, and bearer-token authentication.

use std::sync::Arc;

use chrono::Utc;
use domains::{AppError, AuthProvider, Result, Role, User, UserId, UserRepository};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::views::UserProfile;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A freshly authenticated caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    auth: Arc<dyn AuthProvider>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { users, auth }
    }

    #[instrument(skip_all, fields(username = %input.username))]
    pub async fn register(&self, input: Registration) -> Result<Session> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();

        if username.is_empty() {
            return Err(AppError::validation("Please add a username"));
        }
        if !looks_like_email(&email) {
            return Err(AppError::validation("Please add a valid email"));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        // early exit only; create_user is the authoritative uniqueness check
        let taken = self.users.find_user_by_email(&email).await?.is_some()
            || self.users.find_user_by_username(&username).await?.is_some();
        if taken {
            return Err(AppError::validation("User already exists"));
        }

        let user = User {
            id: UserId::generate(),
            username,
            email,
            password_hash: self.auth.hash_password(&input.password)?,
            avatar: String::new(),
            role: Role::User,
            reputation: 0,
            created_at: Utc::now(),
        };
        self.users.create_user(&user).await?;
        info!(user = %user.id, "user registered");

        self.session_for(&user)
    }

    #[instrument(skip_all)]
    pub async fn login(&self, input: Credentials) -> Result<Session> {
        let email = input.email.trim().to_lowercase();
        let user = self.users.find_user_by_email(&email).await?;

        match user {
            Some(user) if self.auth.verify_password(&input.password, &user.password_hash) => {
                info!(user = %user.id, "user logged in");
                self.session_for(&user)
            }
            _ => Err(AppError::unauthorized("Invalid email or password")),
        }
    }

    /// Resolves a bearer token to a live account.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let id = self.auth.verify_token(token)?;
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Not authorized, user not found"))
    }

    fn session_for(&self, user: &User) -> Result<Session> {
        Ok(Session {
            user: UserProfile::from(user),
            token: self.auth.issue_token(user.id)?,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;
    use domains::{MockAuthProvider, MockUserRepository};

    fn registration(password: &str) -> Registration {
        Registration {
            username: "alice".into(),
            email: "Alice@Example.com".into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("a@b.io"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.io"));
        assert!(!looks_like_email("plain"));
    }

    #[tokio::test]
    async fn short_passwords_are_rejected_before_any_lookup() {
        let mut users = MockUserRepository::new();
        users.expect_find_user_by_email().never();
        let service = AccountService::new(Arc::new(users), Arc::new(MockAuthProvider::new()));

        let err = service.register(registration("12345")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn registration_stores_a_hash_and_returns_a_token() {
        let mut users = MockUserRepository::new();
        users.expect_find_user_by_email().returning(|_| Ok(None));
        users.expect_find_user_by_username().returning(|_| Ok(None));
        users
            .expect_create_user()
            .withf(|u| u.password_hash == "hashed" && u.email == "alice@example.com")
            .times(1)
            .returning(|_| Ok(()));
        let mut auth = MockAuthProvider::new();
        auth.expect_hash_password()
            .returning(|_| Ok("hashed".to_string()));
        auth.expect_issue_token()
            .returning(|_| Ok("token".to_string()));

        let service = AccountService::new(Arc::new(users), Arc::new(auth));
        let session = service.register(registration("hunter22")).await.unwrap();

        assert_eq!(session.token, "token");
        assert_eq!(session.user.reputation, 0);
        assert_eq!(session.user.role, Role::User);
    }

    #[tokio::test]
    async fn duplicate_accounts_are_rejected() {
        let existing = user("alice");
        let mut users = MockUserRepository::new();
        users
            .expect_find_user_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        users.expect_create_user().never();

        let service = AccountService::new(Arc::new(users), Arc::new(MockAuthProvider::new()));
        let err = service.register(registration("hunter22")).await.unwrap_err();
        assert_eq!(err, AppError::validation("User already exists"));
    }

    #[tokio::test]
    async fn a_registration_losing_the_race_in_the_store_is_rejected() {
        let mut users = MockUserRepository::new();
        users.expect_find_user_by_email().returning(|_| Ok(None));
        users.expect_find_user_by_username().returning(|_| Ok(None));
        users
            .expect_create_user()
            .times(1)
            .returning(|_| Err(AppError::validation("User already exists")));
        let mut auth = MockAuthProvider::new();
        auth.expect_hash_password()
            .returning(|_| Ok("hashed".to_string()));
        auth.expect_issue_token().never();

        let service = AccountService::new(Arc::new(users), Arc::new(auth));
        let err = service.register(registration("hunter22")).await.unwrap_err();
        assert_eq!(err, AppError::validation("User already exists"));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let existing = user("alice");
        let mut users = MockUserRepository::new();
        users
            .expect_find_user_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        let mut auth = MockAuthProvider::new();
        auth.expect_verify_password().returning(|_, _| false);

        let service = AccountService::new(Arc::new(users), Arc::new(auth));
        let err = service
            .login(Credentials {
                email: "alice@example.com".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, AppError::unauthorized("Invalid email or password"));
    }
}
