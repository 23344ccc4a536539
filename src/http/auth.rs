//! Bearer-token request authentication.
//!
//! Every route requires an `Authorization: Bearer <token>` header whose
//! token resolves through the session store. Token issuance (OAuth grants,
//! password verification) happens outside this crate; here a token either
//! resolves to a user id or the request is rejected.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::AppError;
use super::state::AppState;
use crate::models::UserId;

/// The authenticated caller, resolved from the bearer token.
#[derive(Debug, Copy, Clone)]
pub struct CurrentUser {
    pub user_id: UserId,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;

        let user_id = state
            .repository
            .verify_session(token)
            .await
            .map_err(AppError::from)?;

        Ok(CurrentUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/entries");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn extracts_token_case_insensitively() {
        let parts = parts_with_auth(Some("bearer abc123"));
        assert_eq!(bearer_token(&parts), Some("abc123"));

        let parts = parts_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&parts), Some("abc123"));
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert_eq!(bearer_token(&parts_with_auth(None)), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("abc123"))), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("Basic abc123"))), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("Bearer "))), None);
    }
}
