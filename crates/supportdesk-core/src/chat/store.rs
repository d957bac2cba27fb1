//! Conversation store service.
//!
//! Wraps a [`ConversationRepository`] with the ownership and lifecycle rules
//! of the chat domain. A deleted conversation and a conversation owned by
//! someone else are both reported as [`ChatError::NotFound`], so callers can
//! never tell them apart from a missing id.

use tracing::{debug, info};

use supportdesk_types::chat::{
    Conversation, ConversationId, ConversationSummary, NEW_CHAT_TITLE, TurnRole,
};
use supportdesk_types::error::ChatError;
use supportdesk_types::user::UserId;

use crate::repository::conversation::ConversationRepository;

pub const DEFAULT_HISTORY_LIMIT: u32 = 10;
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Clamp a requested history size to `1..=MAX_HISTORY_LIMIT`, defaulting to
/// [`DEFAULT_HISTORY_LIMIT`].
pub fn clamp_history_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

pub struct ConversationStore<C: ConversationRepository> {
    repo: C,
}

impl<C: ConversationRepository> ConversationStore<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &C {
        &self.repo
    }

    /// The most recently updated active conversation, or a fresh one.
    ///
    /// A fresh conversation is not persisted here; the first `save` writes
    /// it. Two concurrent calls for the same user may each start one.
    pub async fn get_or_create_active(&self, user_id: &UserId) -> Result<Conversation, ChatError> {
        match self.repo.find_latest_active(user_id).await? {
            Some(conversation) => Ok(conversation),
            None => {
                debug!(user_id = %user_id, "No active conversation, starting one");
                Ok(Conversation::new(*user_id, None))
            }
        }
    }

    /// Summaries of the user's active conversations, most recent first.
    pub async fn list_recent(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let limit = clamp_history_limit(limit);
        Ok(self.repo.list_active(user_id, limit).await?)
    }

    pub async fn load_by_id(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Conversation, ChatError> {
        self.repo
            .find_active(id, user_id)
            .await?
            .ok_or(ChatError::NotFound)
    }

    /// Append one turn and persist the conversation.
    pub async fn append_turn(
        &self,
        mut conversation: Conversation,
        role: TurnRole,
        content: &str,
    ) -> Result<Conversation, ChatError> {
        conversation.push_turn(role, content);
        self.save(&mut conversation).await?;
        Ok(conversation)
    }

    /// Persist the conversation row and any new turns in one write, then
    /// mark the copy as fully stored.
    ///
    /// A copy loaded before another request appended to the same
    /// conversation fails with a storage conflict and must be reloaded.
    pub async fn save(&self, conversation: &mut Conversation) -> Result<(), ChatError> {
        self.repo.save(conversation).await?;
        conversation.mark_persisted();
        Ok(())
    }

    pub async fn soft_delete(&self, id: &ConversationId, user_id: &UserId) -> Result<(), ChatError> {
        if self.repo.soft_delete(id, user_id).await? {
            info!(conversation_id = %id, user_id = %user_id, "Conversation deleted");
            Ok(())
        } else {
            Err(ChatError::NotFound)
        }
    }

    /// Persist a new, empty conversation titled "New Chat".
    pub async fn create_empty(&self, user_id: &UserId) -> Result<Conversation, ChatError> {
        let mut conversation = Conversation::new(*user_id, Some(NEW_CHAT_TITLE.to_string()));
        self.save(&mut conversation).await?;
        info!(conversation_id = %conversation.id, user_id = %user_id, "Conversation created");
        Ok(conversation)
    }
}
