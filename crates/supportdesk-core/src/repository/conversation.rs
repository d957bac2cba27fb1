//! ConversationRepository trait definition.
//!
//! Every read filters out soft-deleted conversations and scopes by owner, so
//! a deleted or foreign conversation looks exactly like a missing one.

use supportdesk_types::chat::{Conversation, ConversationId, ConversationSummary};
use supportdesk_types::error::RepositoryError;
use supportdesk_types::user::UserId;

/// Repository trait for conversation and turn persistence.
///
/// Implementations live in supportdesk-infra (e.g., `SqliteConversationRepository`).
pub trait ConversationRepository: Send + Sync {
    /// The most recently updated active conversation for a user.
    fn find_latest_active(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// An active conversation by id, only if owned by `user_id`.
    fn find_active(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Summaries of active conversations, ordered by updated_at DESC.
    fn list_active(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, RepositoryError>> + Send;

    /// Upsert the conversation row and append the turns past
    /// `persisted_turns`, all in one transaction.
    ///
    /// Fails with `RepositoryError::Conflict` when the conversation belongs
    /// to another user or storage no longer holds exactly
    /// `persisted_turns` turns.
    fn save(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Mark an active conversation owned by `user_id` as deleted.
    ///
    /// Returns `false` if nothing matched.
    fn soft_delete(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
