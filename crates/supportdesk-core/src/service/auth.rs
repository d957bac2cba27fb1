//! Authentication service: signup, login, and bearer token verification.
//!
//! Generic over the user repository, password hasher, and token codec so the
//! credential algorithms stay in supportdesk-infra.

use chrono::Utc;
use tracing::{info, warn};

use supportdesk_types::error::{AuthError, FieldError, RepositoryError, ValidationError};
use supportdesk_types::user::{AuthSession, User, UserId, UserRecord, normalize_email};

use crate::repository::user::UserRepository;
use crate::service::credential::{PasswordHasher, TokenCodec};

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_PASSWORD_CHARS: usize = 128;
pub const MAX_EMAIL_CHARS: usize = 254;

/// Service owning user credentials and token issue/verification.
pub struct AuthService<U: UserRepository, H: PasswordHasher, T: TokenCodec> {
    user_repo: U,
    hasher: H,
    tokens: T,
}

impl<U: UserRepository, H: PasswordHasher, T: TokenCodec> AuthService<U, H, T> {
    pub fn new(user_repo: U, hasher: H, tokens: T) -> Self {
        Self {
            user_repo,
            hasher,
            tokens,
        }
    }

    /// Register a new user and issue their first token.
    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        validate_credentials(email, password)?;
        let email = normalize_email(email);

        let record = UserRecord {
            user: User {
                id: UserId::new(),
                email: email.clone(),
                created_at: Utc::now(),
            },
            password_hash: self.hasher.hash_password(password)?,
        };

        self.user_repo
            .create_user(&record)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken(email.clone()),
                other => AuthError::Storage(other.to_string()),
            })?;

        info!(user_id = %record.user.id, "User registered");

        let token = self.tokens.issue(&record.user.id)?;
        Ok(AuthSession {
            token,
            user: record.user,
        })
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let record = self
            .user_repo
            .find_by_email(&email)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify_password(password, &record.password_hash)? {
            warn!(user_id = %record.user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&record.user.id)?;
        Ok(AuthSession {
            token,
            user: record.user,
        })
    }

    /// Resolve a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.tokens.verify(token)?;
        self.user_repo
            .find_by_id(&user_id)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or(AuthError::UnknownUser)
    }
}

/// Reject a request whose caller is not the declared owner of a resource.
pub fn authorize_owner(caller: &UserId, owner: &UserId) -> Result<(), AuthError> {
    if caller == owner {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Validate a signup payload, collecting every failing field.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    let email = email.trim();
    if email.chars().count() > MAX_EMAIL_CHARS || !looks_like_email(email) {
        errors.push(FieldError::new("email", "Please provide a valid email"));
    }

    let password_chars = password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&password_chars) {
        errors.push(FieldError::new(
            "password",
            format!(
                "Password must be between {MIN_PASSWORD_CHARS} and {MAX_PASSWORD_CHARS} characters"
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(errors))
    }
}

/// `local@domain.tld` with no whitespace and a non-empty label on each side
/// of the last dot.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}
