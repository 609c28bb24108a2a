use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::services::auth::Claims;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;
use std::sync::Arc;

/// Extracts and verifies the session token of the calling user.
pub struct RequireAuth(pub Claims);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Session token from the `Authorization: Bearer` header, or from `?token=`
/// for browser navigations to `/auth` that cannot set headers.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self> {
        let token = session_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = state.auth_service.verify_token(&token).await?;
        Ok(RequireAuth(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_header_token_wins_over_query() {
        let parts = parts("/auth?token=from-query", Some("Bearer from-header"));
        assert_eq!(session_token(&parts).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_query_token_is_percent_decoded() {
        let parts = parts("/auth?next=%2Fme&token=abc%2Edef%2Eghi", None);
        assert_eq!(session_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(session_token(&parts("/auth", None)), None);
        assert_eq!(session_token(&parts("/auth?token=", None)), None);
        assert_eq!(session_token(&parts("/auth?mytoken=x", None)), None);
        assert_eq!(session_token(&parts("/auth", Some("Basic abc"))), None);
    }
}
