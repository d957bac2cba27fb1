//! Signup and login handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use supportdesk_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// Body of `POST /auth/signup` and `POST /auth/login`.
///
/// Missing fields decode as empty strings so they surface as validation
/// errors rather than JSON rejections.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: User,
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(body) = body?;
    let session = state.auth_service.signup(&body.email, &body.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            token: session.token,
            user: session.user,
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(body) = body?;
    let session = state.auth_service.login(&body.email, &body.password).await?;
    Ok(Json(AuthResponse {
        message: "Login successful",
        token: session.token,
        user: session.user,
    }))
}
