//! UserRepository trait definition.

use supportdesk_types::error::RepositoryError;
use supportdesk_types::user::{User, UserId, UserRecord};

/// Repository trait for user credential persistence.
///
/// Implementations live in supportdesk-infra (e.g., `SqliteUserRepository`).
/// Emails are passed already normalized.
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A duplicate email is `RepositoryError::Conflict`.
    fn create_user(
        &self,
        record: &UserRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Look up a user and their password hash by normalized email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserRecord>, RepositoryError>> + Send;

    fn find_by_id(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
