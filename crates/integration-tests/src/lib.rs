//! # integration-tests
//!
//! Drives the full axum router over an in-memory store. Requests go through
//! `tower::ServiceExt::oneshot`, so no socket is bound.

use std::sync::Arc;

use api_adapters::{router, AppState};
use auth_adapters::JwtAuthProvider;
use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use domains::{AuthProvider, Role, User, UserId, UserRepository};
use fake::faker::internet::en::Username;
use fake::Fake;
use serde_json::{json, Value};
use services::{ForumLimits, Repositories, Services};
use storage_adapters::MemoryStore;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    auth: Arc<JwtAuthProvider>,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A registered account and its bearer token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub token: String,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_limits(ForumLimits::default())
    }

    pub fn with_limits(limits: ForumLimits) -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(JwtAuthProvider::new(b"integration-secret", Duration::hours(1)));
        let services = Services::new(Repositories::from_store(store.clone()), auth.clone(), limits);

        Self {
            router: router(AppState::new(services)),
            store,
            auth,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    /// Unparsed response, for header assertions.
    pub async fn raw_get(&self, uri: &str) -> Response {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, user: Option<&TestUser>) -> TestResponse {
        self.request(Method::GET, uri, user.map(|u| u.token.as_str()), None)
            .await
    }

    pub async fn post(&self, uri: &str, user: Option<&TestUser>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, user.map(|u| u.token.as_str()), Some(body))
            .await
    }

    pub async fn put(&self, uri: &str, user: Option<&TestUser>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, user.map(|u| u.token.as_str()), Some(body))
            .await
    }

    pub async fn delete(&self, uri: &str, user: Option<&TestUser>) -> TestResponse {
        self.request(Method::DELETE, uri, user.map(|u| u.token.as_str()), None)
            .await
    }

    /// Registers a user with a random, unique username.
    pub async fn register(&self) -> TestUser {
        let base: String = Username().fake();
        let suffix = UserId::generate().to_string();
        let username = format!("{base}_{}", &suffix[suffix.len() - 8..]);
        let email = format!("{username}@example.com").to_lowercase();

        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({ "username": username, "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        TestUser {
            id: response.body["user"]["id"].as_str().unwrap().to_string(),
            username,
            email,
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Admins cannot self-register; they are written straight to the store.
    pub async fn admin(&self) -> TestUser {
        let id = UserId::generate();
        let username = format!("admin-{id}");
        let user = User {
            id,
            username: username.clone(),
            email: format!("{id}@admin.example.com"),
            password_hash: self.auth.hash_password(PASSWORD).unwrap(),
            avatar: String::new(),
            role: Role::Admin,
            reputation: 0,
            created_at: Utc::now(),
        };
        self.store.create_user(&user).await.unwrap();

        TestUser {
            id: id.to_string(),
            username,
            email: user.email,
            token: self.auth.issue_token(id).unwrap(),
        }
    }

    pub async fn reputation(&self, user: &TestUser) -> i64 {
        let response = self.get("/api/auth/me", Some(user)).await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["reputation"].as_i64().unwrap()
    }

    /// Posts a question and returns its JSON.
    pub async fn ask(&self, user: &TestUser, title: &str, tags: &[&str]) -> Value {
        let response = self
            .post(
                "/api/questions",
                Some(user),
                json!({ "title": title, "description": format!("About {title}"), "tags": tags }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }

    /// Answers a question and returns the answer JSON.
    pub async fn answer(&self, user: &TestUser, question_id: &str, content: &str) -> Value {
        let response = self
            .post(
                &format!("/api/questions/{question_id}/answers"),
                Some(user),
                json!({ "content": content }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }
}

/// The `id` field of a JSON entity.
pub fn id_of(entity: &Value) -> String {
    entity["id"].as_str().unwrap().to_string()
}
