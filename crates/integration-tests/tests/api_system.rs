use axum::http::StatusCode;
use integration_tests::{id_of, TestApp};
use serde_json::json;

#[tokio::test]
async fn root_welcomes_and_unknown_paths_are_json_404s() {
    let app = TestApp::new();

    let root = app.get("/", None).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body["message"], "Welcome to StackIt API");

    let missing = app.get("/api/nope", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Not Found - /api/nope");
}

#[tokio::test]
async fn metrics_count_writes() {
    let app = TestApp::new();
    let asker = app.register().await;
    let voter = app.register().await;
    let question = app.ask(&asker, "Counting", &[]).await;
    app.put(
        &format!("/api/questions/{}/vote", id_of(&question)),
        Some(&voter),
        json!({ "voteType": "upvote" }),
    )
    .await;

    let metrics = app.get("/metrics", None).await;
    assert_eq!(metrics.status, StatusCode::OK);
    let text = metrics.body.as_str().unwrap();
    assert!(text.contains(r#"stackit_posts_created_total{kind="question"} 1"#));
    assert!(text.contains(r#"stackit_votes_total{target="question",direction="upvote"} 1"#));
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new();
    let response = app.raw_get("/").await;
    assert!(response.headers().contains_key("x-request-id"));
}
