use serde::Serialize;
use thiserror::Error;

/// Errors from repository operations (used by trait definitions in supportdesk-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Input rejected before any state was touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", join_fields(.0))]
pub struct ValidationError(pub Vec<FieldError>);

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

/// Why a bearer token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Signature valid but `exp` is in the past.
    Expired,
    /// Bad signature, wrong issuer, or undecodable token.
    Malformed,
    /// Token valid but the user no longer exists.
    Unknown,
}

/// Errors from signup, login, and token verification.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("access token required")]
    MissingToken,

    #[error("token expired")]
    TokenExpired,

    #[error("token is malformed or invalid")]
    TokenMalformed,

    #[error("user not found")]
    UnknownUser,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    #[error("you can only access your own resources")]
    Forbidden,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// The token-level rejection this error represents, if any.
    pub fn token_rejection(&self) -> Option<TokenRejection> {
        match self {
            AuthError::TokenExpired => Some(TokenRejection::Expired),
            AuthError::TokenMalformed => Some(TokenRejection::Malformed),
            AuthError::UnknownUser => Some(TokenRejection::Unknown),
            _ => None,
        }
    }
}

impl From<TokenRejection> for AuthError {
    fn from(r: TokenRejection) -> Self {
        match r {
            TokenRejection::Expired => AuthError::TokenExpired,
            TokenRejection::Malformed => AuthError::TokenMalformed,
            TokenRejection::Unknown => AuthError::UnknownUser,
        }
    }
}

/// Errors from conversation operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing, soft-deleted, or owned by someone else.
    #[error("chat not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound,
            other => ChatError::Storage(other.to_string()),
        }
    }
}
