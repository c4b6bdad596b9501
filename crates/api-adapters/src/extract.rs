//! Request extractors: the authenticated caller, and body, path and query
//! wrappers whose rejections are `{message}` JSON like every other error.

use std::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use domains::{AppError, User, VoteType};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// The account behind a valid `Authorization: Bearer <token>` header.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| AppError::unauthorized("Not authorized, no token"))?;
        let user = state.services.accounts.authenticate(token).await?;
        Ok(Self(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// `axum::Json` whose rejections become 400 `{message}` responses.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `axum::extract::Path` with `{message}` rejections.
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `axum::extract::Query` with `{message}` rejections.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// A malformed id cannot name an existing entity.
pub fn parse_id<I: FromStr>(raw: &str, entity: &'static str) -> Result<I, ApiError> {
    raw.parse().map_err(|_| ApiError(AppError::NotFound(entity)))
}

/// Unparseable or missing page numbers fall back to the first page.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse().ok()).unwrap_or(1)
}

/// Blank filter parameters are treated as absent.
pub fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct VoteBody {
    #[serde(rename = "voteType", default)]
    pub vote_type: Option<String>,
}

impl VoteBody {
    pub fn vote(&self) -> Result<VoteType, ApiError> {
        match self.vote_type.as_deref() {
            Some("upvote") => Ok(VoteType::Upvote),
            Some("downvote") => Ok(VoteType::Downvote),
            _ => Err(ApiError(AppError::validation("Invalid vote type"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use domains::QuestionId;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_tokens_need_the_scheme_and_a_value() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[test]
    fn pages_are_lenient() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
    }

    #[test]
    fn malformed_ids_are_not_found() {
        let err = parse_id::<QuestionId>("not-a-uuid", "Question").unwrap_err();
        assert_eq!(err.0, AppError::NotFound("Question"));
    }

    #[test]
    fn vote_bodies_accept_only_the_two_directions() {
        let body = |v: &str| VoteBody {
            vote_type: Some(v.to_string()),
        };
        assert_eq!(body("upvote").vote().unwrap(), VoteType::Upvote);
        assert_eq!(body("downvote").vote().unwrap(), VoteType::Downvote);
        assert!(body("sideways").vote().is_err());
        assert!(VoteBody::default().vote().is_err());
    }
}
