use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{QuestionDraft, QuestionFilter, QuestionPatch, VoteTarget};
use serde::Deserialize;
use serde_json::{json, Value};
use services::{QuestionPage, QuestionView};

use crate::error::ApiResult;
use crate::extract::{
    non_blank, parse_id, parse_page, AuthUser, JsonBody, PathParam, QueryParams, VoteBody,
};
use crate::metrics::PostKind;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub keyword: Option<String>,
    pub tag: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    JsonBody(draft): JsonBody<QuestionDraft>,
) -> ApiResult<(StatusCode, Json<QuestionView>)> {
    let view = state.services.questions.create(&author, draft).await?;
    state.metrics.record_post(PostKind::Question);
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<QuestionPage>> {
    let filter = QuestionFilter {
        keyword: non_blank(params.keyword),
        tag: non_blank(params.tag),
    };
    let page = parse_page(params.page.as_deref());
    Ok(Json(state.services.questions.list(filter, page).await?))
}

pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<QuestionView>> {
    let id = parse_id(&id, "Question")?;
    Ok(Json(state.services.questions.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<String>,
    JsonBody(patch): JsonBody<QuestionPatch>,
) -> ApiResult<Json<QuestionView>> {
    let id = parse_id(&id, "Question")?;
    Ok(Json(state.services.questions.update(id, &caller, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "Question")?;
    state.services.questions.delete(id, &caller).await?;
    Ok(Json(json!({ "message": "Question removed" })))
}

pub async fn vote(
    State(state): State<AppState>,
    AuthUser(voter): AuthUser,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<VoteBody>,
) -> ApiResult<Json<QuestionView>> {
    let id = parse_id(&id, "Question")?;
    let vote = body.vote()?;
    let view = state.services.questions.vote(id, &voter, vote).await?;
    state.metrics.record_vote(VoteTarget::Question, vote);
    Ok(Json(view))
}
