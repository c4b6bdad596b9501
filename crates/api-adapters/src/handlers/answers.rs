use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::VoteTarget;
use serde::Deserialize;
use serde_json::{json, Value};
use services::AnswerView;

use crate::error::ApiResult;
use crate::extract::{parse_id, AuthUser, JsonBody, PathParam, VoteBody};
use crate::metrics::PostKind;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NewAnswer {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnswerEdit {
    pub content: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    PathParam(question_id): PathParam<String>,
    JsonBody(body): JsonBody<NewAnswer>,
) -> ApiResult<(StatusCode, Json<AnswerView>)> {
    let question_id = parse_id(&question_id, "Question")?;
    let view = state
        .services
        .answers
        .create(question_id, &author, body.content)
        .await?;
    state.metrics.record_post(PostKind::Answer);
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list(
    State(state): State<AppState>,
    PathParam(question_id): PathParam<String>,
) -> ApiResult<Json<Vec<AnswerView>>> {
    let question_id = parse_id(&question_id, "Question")?;
    Ok(Json(state.services.answers.list(question_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<AnswerEdit>,
) -> ApiResult<Json<AnswerView>> {
    let id = parse_id(&id, "Answer")?;
    Ok(Json(state.services.answers.update(id, &caller, body.content).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "Answer")?;
    state.services.answers.delete(id, &caller).await?;
    Ok(Json(json!({ "message": "Answer removed" })))
}

pub async fn vote(
    State(state): State<AppState>,
    AuthUser(voter): AuthUser,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<VoteBody>,
) -> ApiResult<Json<AnswerView>> {
    let id = parse_id(&id, "Answer")?;
    let vote = body.vote()?;
    let view = state.services.answers.vote(id, &voter, vote).await?;
    state.metrics.record_vote(VoteTarget::Answer, vote);
    Ok(Json(view))
}

pub async fn accept(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<AnswerView>> {
    let id = parse_id(&id, "Answer")?;
    let view = state.services.answers.accept(id, &caller).await?;
    state.metrics.record_acceptance();
    Ok(Json(view))
}
