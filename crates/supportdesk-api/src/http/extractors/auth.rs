//! Bearer token authentication extractor.
//!
//! Reads `Authorization: Bearer <token>`, verifies the token, and resolves
//! the user it was issued for. Handlers that take [`AuthUser`] never run for
//! unauthenticated requests.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use supportdesk_types::error::AuthError;
use supportdesk_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let user = state.auth_service.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

/// The credential part of the `Authorization` header, if there is one.
///
/// Only the second whitespace-separated part is used, so a header without a
/// scheme counts as missing.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    header.split_whitespace().nth(1).filter(|t| !t.is_empty())
}
