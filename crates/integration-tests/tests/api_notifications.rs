use axum::http::StatusCode;
use integration_tests::{id_of, TestApp};
use serde_json::json;

#[tokio::test]
async fn answering_and_accepting_notify_the_other_party() {
    let app = TestApp::new();
    let asker = app.register().await;
    let helper = app.register().await;
    let question = app.ask(&asker, "What is Pin?", &[]).await;
    let answer = app.answer(&helper, &id_of(&question), "A pointer wrapper").await;

    let inbox = app.get("/api/notifications", Some(&asker)).await;
    let inbox = inbox.body.as_array().unwrap().clone();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["type"], "answer");
    assert_eq!(inbox[0]["read"], false);
    assert_eq!(inbox[0]["sender"]["username"], helper.username.as_str());
    assert_eq!(inbox[0]["question"]["id"], id_of(&question).as_str());
    assert_eq!(inbox[0]["question"]["title"], "What is Pin?");
    assert_eq!(
        inbox[0]["message"],
        format!("{} answered your question: \"What is Pin?\"", helper.username)
    );

    app.put(
        &format!("/api/answers/{}/accept", id_of(&answer)),
        Some(&asker),
        json!({}),
    )
    .await;
    let inbox = app.get("/api/notifications", Some(&helper)).await;
    assert_eq!(inbox.body[0]["type"], "accept");
    assert_eq!(inbox.body[0]["answer"], id_of(&answer).as_str());
}

#[tokio::test]
async fn self_actions_notify_nobody() {
    let app = TestApp::new();
    let asker = app.register().await;
    let question = app.ask(&asker, "Talking to myself", &[]).await;
    let answer = app.answer(&asker, &id_of(&question), "Answering myself").await;
    app.put(
        &format!("/api/answers/{}/accept", id_of(&answer)),
        Some(&asker),
        json!({}),
    )
    .await;

    let inbox = app.get("/api/notifications", Some(&asker)).await;
    assert!(inbox.body.as_array().unwrap().is_empty());
    let unread = app.get("/api/notifications/unread-count", Some(&asker)).await;
    assert_eq!(unread.body["count"], 0);
}

#[tokio::test]
async fn read_state_belongs_to_the_recipient() {
    let app = TestApp::new();
    let asker = app.register().await;
    let helper = app.register().await;
    let question = app.ask(&asker, "Inbox", &[]).await;
    app.answer(&helper, &id_of(&question), "one").await;
    app.answer(&helper, &id_of(&question), "two").await;

    let unread = app.get("/api/notifications/unread-count", Some(&asker)).await;
    assert_eq!(unread.body["count"], 2);

    let inbox = app.get("/api/notifications", Some(&asker)).await;
    let first = id_of(&inbox.body[0]);
    let uri = format!("/api/notifications/{first}/read");

    let intruder = app.put(&uri, Some(&helper), json!({})).await;
    assert_eq!(intruder.status, StatusCode::UNAUTHORIZED);

    let read = app.put(&uri, Some(&asker), json!({})).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["read"], true);
    assert_eq!(read.body["question"]["title"], "Inbox");
    let unread = app.get("/api/notifications/unread-count", Some(&asker)).await;
    assert_eq!(unread.body["count"], 1);

    let all = app
        .put("/api/notifications/read-all", Some(&asker), json!({}))
        .await;
    assert_eq!(all.body["updated"], 1);
    let unread = app.get("/api/notifications/unread-count", Some(&asker)).await;
    assert_eq!(unread.body["count"], 0);
}

#[tokio::test]
async fn notifications_survive_their_question() {
    let app = TestApp::new();
    let asker = app.register().await;
    let helper = app.register().await;
    let question = app.ask(&asker, "Soon deleted", &[]).await;
    app.answer(&helper, &id_of(&question), "hi").await;
    app.delete(&format!("/api/questions/{}", id_of(&question)), Some(&asker))
        .await;

    let inbox = app.get("/api/notifications", Some(&asker)).await;
    assert_eq!(inbox.body.as_array().unwrap().len(), 1);
    assert!(inbox.body[0]["question"].is_null());
    assert!(inbox.body[0]["answer"].is_null());
}
