//! Credential ports: password hashing and bearer token signing.
//!
//! Defined in supportdesk-core so the auth service can hash passwords and
//! issue tokens without coupling to a specific algorithm. The Argon2 and JWT
//! adapters live in supportdesk-infra.

use supportdesk_types::error::{AuthError, TokenRejection};
use supportdesk_types::user::UserId;

/// Abstraction over one-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string (PHC format).
    fn hash_password(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; `Err` is reserved for unreadable hashes.
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Abstraction over signed, time-bounded bearer tokens.
pub trait TokenCodec: Send + Sync {
    /// Issue a token for `user_id` that expires after the configured TTL.
    fn issue(&self, user_id: &UserId) -> Result<String, AuthError>;

    /// Verify signature, issuer, and expiry, returning the subject.
    ///
    /// Never returns [`TokenRejection::Unknown`]; user existence is checked
    /// by the auth service.
    fn verify(&self, token: &str) -> Result<UserId, TokenRejection>;
}
