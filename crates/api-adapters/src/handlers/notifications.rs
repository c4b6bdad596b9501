use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use services::NotificationView;

use crate::error::ApiResult;
use crate::extract::{parse_id, AuthUser, PathParam};
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<Vec<NotificationView>>> {
    Ok(Json(state.services.notifications.list(&caller).await?))
}

pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<Value>> {
    let count = state.services.notifications.unread_count(&caller).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn read_all(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<Value>> {
    let updated = state.services.notifications.mark_all_read(&caller).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<NotificationView>> {
    let id = parse_id(&id, "Notification")?;
    Ok(Json(state.services.notifications.mark_read(id, &caller).await?))
}
