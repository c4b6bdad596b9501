//! Fixtures shared by the service unit tests.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Answer, MockAnswerRepository, MockNotificationRepository, MockQuestionRepository,
    MockUserRepository, Question, QuestionDraft, Role, User, UserId,
};

use crate::Repositories;

#[derive(Default)]
pub(crate) struct Mocks {
    pub users: MockUserRepository,
    pub questions: MockQuestionRepository,
    pub answers: MockAnswerRepository,
    pub notifications: MockNotificationRepository,
}

pub(crate) fn repositories(mocks: Mocks) -> Repositories {
    Repositories {
        users: Arc::new(mocks.users),
        questions: Arc::new(mocks.questions),
        answers: Arc::new(mocks.answers),
        notifications: Arc::new(mocks.notifications),
    }
}

pub(crate) fn user(name: &str) -> User {
    User {
        id: UserId::generate(),
        username: name.to_string(),
        email: format!("{name}@example.com"),
        password_hash: String::new(),
        avatar: String::new(),
        role: Role::User,
        reputation: 0,
        created_at: Utc::now(),
    }
}

pub(crate) fn question_by(owner: &User) -> Question {
    let draft = QuestionDraft {
        title: "How do I pin a future?".into(),
        description: "It will not compile.".into(),
        tags: vec!["rust".into()],
    };
    Question::new(draft, owner.id).unwrap()
}

pub(crate) fn answer_to(question: &Question, author: &User) -> Answer {
    Answer::new("Box::pin it.".into(), author.id, question.id).unwrap()
}
