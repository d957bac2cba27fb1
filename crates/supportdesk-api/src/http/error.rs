//! Application error type mapping to HTTP status codes.
//!
//! Every error body has the shape `{error, message, details?}`. Internal
//! failures are logged in full and answered with a generic message; the
//! development-only [`expose_internal_detail`] middleware swaps the detail
//! back in.

use axum::Json;
use axum::extract::Request;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use supportdesk_types::error::{AuthError, ChatError, FieldError, ValidationError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Chat(ChatError),
    /// Request body or query string could not be decoded.
    BadRequest(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Auth(AuthError::Validation(e))
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Full detail of a 500, carried as a response extension.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

const NOT_FOUND_MESSAGE: &str = "The requested chat does not exist or you do not have access to it";

fn validation_body(e: &ValidationError) -> ErrorBody {
    ErrorBody {
        error: "Validation failed".to_string(),
        message: e
            .fields()
            .first()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| e.to_string()),
        details: Some(e.fields().to_vec()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Auth(AuthError::MissingToken) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Access token required", "Please provide a valid authentication token"),
            ),
            AppError::Auth(AuthError::TokenMalformed) => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("Invalid token", "Token is malformed or invalid"),
            ),
            AppError::Auth(AuthError::TokenExpired) => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("Token expired", "Please login again"),
            ),
            AppError::Auth(AuthError::UnknownUser) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Invalid token", "User not found"),
            ),
            AppError::Auth(AuthError::Forbidden) => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("Forbidden", "You can only access your own resources"),
            ),
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Invalid credentials", "Email or password is incorrect"),
            ),
            AppError::Auth(AuthError::EmailTaken(_)) => (
                StatusCode::CONFLICT,
                ErrorBody::new("User already exists", "An account with this email already exists"),
            ),
            AppError::Auth(AuthError::Validation(e)) | AppError::Chat(ChatError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, validation_body(e))
            }
            AppError::Chat(ChatError::NotFound) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("Chat not found", NOT_FOUND_MESSAGE),
            ),
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Bad request", message.clone()),
            ),
            AppError::Auth(AuthError::Credential(detail))
            | AppError::Auth(AuthError::Storage(detail))
            | AppError::Chat(ChatError::Storage(detail)) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new("Server error", "Something went wrong!")),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(InternalErrorDetail(detail.clone()));
                return response;
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Development-only middleware: replace the generic 500 message with the
/// logged detail.
pub async fn expose_internal_detail(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    match response.extensions_mut().remove::<InternalErrorDetail>() {
        Some(InternalErrorDetail(detail)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Server error", detail)),
        )
            .into_response(),
        None => response,
    }
}
