use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use services::{Credentials, Registration, Session, UserProfile};

use crate::error::ApiResult;
use crate::extract::{AuthUser, JsonBody};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<Registration>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = state.services.accounts.register(input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<Credentials>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.services.accounts.login(input).await?))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}
