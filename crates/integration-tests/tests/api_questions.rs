use axum::http::StatusCode;
use integration_tests::{id_of, TestApp};
use serde_json::json;

#[tokio::test]
async fn creating_requires_auth_and_a_title() {
    let app = TestApp::new();
    let user = app.register().await;

    let anonymous = app
        .post("/api/questions", None, json!({ "title": "t", "description": "d" }))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let untitled = app
        .post(
            "/api/questions",
            Some(&user),
            json!({ "title": "  ", "description": "d" }),
        )
        .await;
    assert_eq!(untitled.status, StatusCode::BAD_REQUEST);
    assert_eq!(untitled.body["message"], "Please add a title");

    let question = app.ask(&user, "Borrowing twice", &["rust", "borrowck"]).await;
    assert_eq!(question["user"]["username"], user.username.as_str());
    assert_eq!(question["voteCount"], 0);
    assert_eq!(question["views"], 0);
    assert_eq!(question["tags"], json!(["rust", "borrowck"]));
    assert!(question["acceptedAnswer"].is_null());
}

#[tokio::test]
async fn reading_a_question_counts_views_and_nests_answers() {
    let app = TestApp::new();
    let owner = app.register().await;
    let helper = app.register().await;
    let question = app.ask(&owner, "Async closures", &[]).await;
    let id = id_of(&question);
    app.answer(&helper, &id, "Use a boxed future").await;

    let first = app.get(&format!("/api/questions/{id}"), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["views"], 1);
    assert_eq!(first.body["answers"].as_array().unwrap().len(), 1);
    assert_eq!(
        first.body["answers"][0]["user"]["username"],
        helper.username.as_str()
    );

    let second = app.get(&format!("/api/questions/{id}"), None).await;
    assert_eq!(second.body["views"], 2);
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let app = TestApp::new();

    let malformed = app.get("/api/questions/not-an-id", None).await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
    assert_eq!(malformed.body["message"], "Question not found");

    let missing = app
        .get("/api/questions/0190f5b2-0000-7000-8000-000000000000", None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn fifteen_questions_paginate_into_two_pages() {
    let app = TestApp::new();
    let user = app.register().await;
    for n in 0..15 {
        app.ask(&user, &format!("Question {n}"), &["paging"]).await;
    }

    let first = app.get("/api/questions", None).await;
    assert_eq!(first.body["questions"].as_array().unwrap().len(), 10);
    assert_eq!(first.body["page"], 1);
    assert_eq!(first.body["pages"], 2);
    assert_eq!(first.body["questions"][0]["title"], "Question 14");

    let second = app.get("/api/questions?page=2", None).await;
    assert_eq!(second.body["questions"].as_array().unwrap().len(), 5);
    assert_eq!(second.body["page"], 2);
    assert_eq!(second.body["pages"], 2);

    let lenient = app.get("/api/questions?page=banana", None).await;
    assert_eq!(lenient.body["page"], 1);
}

#[tokio::test]
async fn malformed_query_strings_are_json_errors() {
    let app = TestApp::new();

    let response = app.get("/api/questions?page=1&page=2", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let message = response.body["message"].as_str().unwrap();
    assert!(message.contains("page"), "{message}");
}

#[tokio::test]
async fn keyword_and_tag_filters_combine() {
    let app = TestApp::new();
    let user = app.register().await;
    app.ask(&user, "Tokio runtime panics", &["tokio"]).await;
    app.ask(&user, "Runtime reflection", &["java"]).await;
    app.ask(&user, "Serde enums", &["serde"]).await;

    let keyword = app.get("/api/questions?keyword=RUNTIME", None).await;
    assert_eq!(keyword.body["questions"].as_array().unwrap().len(), 2);

    let both = app
        .get("/api/questions?keyword=runtime&tag=tokio", None)
        .await;
    let questions = both.body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["title"], "Tokio runtime panics");

    let none = app.get("/api/questions?tag=go", None).await;
    assert_eq!(none.body["pages"], 0);
}

#[tokio::test]
async fn only_the_owner_updates_and_admins_may_delete() {
    let app = TestApp::new();
    let owner = app.register().await;
    let stranger = app.register().await;
    let admin = app.admin().await;
    let question = app.ask(&owner, "Original title", &["a"]).await;
    let uri = format!("/api/questions/{}", id_of(&question));

    let hijack = app
        .put(&uri, Some(&stranger), json!({ "title": "Mine now" }))
        .await;
    assert_eq!(hijack.status, StatusCode::UNAUTHORIZED);
    assert_eq!(hijack.body["message"], "Not authorized to update this question");

    let edit = app
        .put(&uri, Some(&owner), json!({ "title": "Better title", "description": "" }))
        .await;
    assert_eq!(edit.status, StatusCode::OK);
    assert_eq!(edit.body["title"], "Better title");
    assert_eq!(edit.body["description"], "About Original title");

    let denied = app.delete(&uri, Some(&stranger)).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let removed = app.delete(&uri, Some(&admin)).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["message"], "Question removed");
    assert_eq!(app.get(&uri, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn voting_toggles_and_switches() {
    let app = TestApp::new();
    let owner = app.register().await;
    let voter = app.register().await;
    let question = app.ask(&owner, "Votes", &[]).await;
    let uri = format!("/api/questions/{}/vote", id_of(&question));

    let up = app.put(&uri, Some(&voter), json!({ "voteType": "upvote" })).await;
    assert_eq!(up.body["voteCount"], 1);
    assert_eq!(up.body["upvotes"][0]["username"], voter.username.as_str());
    assert_eq!(app.reputation(&owner).await, 5);

    let again = app.put(&uri, Some(&voter), json!({ "voteType": "upvote" })).await;
    assert_eq!(again.body["voteCount"], 0);
    assert!(again.body["upvotes"].as_array().unwrap().is_empty());

    app.put(&uri, Some(&voter), json!({ "voteType": "upvote" })).await;
    let switched = app.put(&uri, Some(&voter), json!({ "voteType": "downvote" })).await;
    assert_eq!(switched.body["voteCount"], -1);
    assert!(switched.body["upvotes"].as_array().unwrap().is_empty());
    assert_eq!(switched.body["downvotes"].as_array().unwrap().len(), 1);

    let invalid = app.put(&uri, Some(&voter), json!({ "voteType": "sideways" })).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["message"], "Invalid vote type");
}

#[tokio::test]
async fn deleting_a_question_removes_its_answers() {
    let app = TestApp::new();
    let owner = app.register().await;
    let helper = app.register().await;
    let question = app.ask(&owner, "Cascade", &[]).await;
    let id = id_of(&question);
    let answer = app.answer(&helper, &id, "soon gone").await;

    app.delete(&format!("/api/questions/{id}"), Some(&owner)).await;

    let orphan = app
        .put(
            &format!("/api/answers/{}", id_of(&answer)),
            Some(&helper),
            json!({ "content": "still here?" }),
        )
        .await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);
    assert_eq!(orphan.body["message"], "Answer not found");
}
