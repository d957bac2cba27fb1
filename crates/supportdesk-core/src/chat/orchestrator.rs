//! Chat orchestrator: the per-message "send" state machine.
//!
//! validate -> load-or-create -> append user turn -> bounded context ->
//! completion -> append assistant turn (text or apology) -> title rule ->
//! one persist -> summary.
//!
//! Completion failures never escape `send_message`. They become a fixed
//! apology turn, so every accepted user turn is answered and persisted
//! together with its reply.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use supportdesk_types::chat::{ConversationId, TurnRole};
use supportdesk_types::error::{ChatError, ValidationError};
use supportdesk_types::llm::CompletionError;
use supportdesk_types::user::UserId;

use crate::chat::gateway::CompletionGateway;
use crate::chat::store::ConversationStore;
use crate::chat::title::apply_title_rule;
use crate::repository::conversation::ConversationRepository;

pub const APOLOGY_MISCONFIGURED_KEY: &str = "I'm sorry, but our AI service is not properly configured. Please contact our support team for immediate assistance.";
pub const APOLOGY_QUOTA: &str = "I'm sorry, but our AI service is temporarily unavailable due to credit limits. Please contact our support team for immediate assistance, or try again later.";
pub const APOLOGY_RATE_LIMITED: &str =
    "I'm currently handling a lot of requests. Please try again in a few moments.";
pub const APOLOGY_NOT_CONFIGURED: &str = "I'm sorry, but our AI service is not properly set up. Please contact our support team for help.";
pub const APOLOGY_TECHNICAL: &str = "I'm sorry, I'm experiencing technical difficulties right now. Please try again in a moment, or contact our support team if the issue persists.";

/// The user-facing assistant text for a completion failure.
pub fn apology_for(error: &CompletionError) -> &'static str {
    match error {
        CompletionError::Unauthorized => APOLOGY_MISCONFIGURED_KEY,
        CompletionError::QuotaExceeded => APOLOGY_QUOTA,
        CompletionError::RateLimited => APOLOGY_RATE_LIMITED,
        CompletionError::NotConfigured => APOLOGY_NOT_CONFIGURED,
        CompletionError::BadRequest(_)
        | CompletionError::Unavailable { .. }
        | CompletionError::Timeout => APOLOGY_TECHNICAL,
    }
}

/// Trim and bound a user message.
pub fn validate_message(raw: &str, max_chars: usize) -> Result<String, ValidationError> {
    let message = raw.trim();
    let chars = message.chars().count();
    if chars == 0 || chars > max_chars {
        return Err(ValidationError::single(
            "message",
            format!("Message must be between 1 and {max_chars} characters"),
        ));
    }
    Ok(message.to_string())
}

/// What a successful send returns to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    /// The assistant turn: completion text or an apology.
    pub message: String,
    pub chat_id: ConversationId,
    pub message_count: usize,
}

pub struct ChatOrchestrator<C: ConversationRepository> {
    store: ConversationStore<C>,
    gateway: Arc<CompletionGateway>,
    max_message_chars: usize,
}

impl<C: ConversationRepository> ChatOrchestrator<C> {
    pub fn new(
        store: ConversationStore<C>,
        gateway: Arc<CompletionGateway>,
        max_message_chars: usize,
    ) -> Self {
        Self {
            store,
            gateway,
            max_message_chars,
        }
    }

    pub fn store(&self) -> &ConversationStore<C> {
        &self.store
    }

    /// Handle one inbound user message.
    ///
    /// Errors are limited to validation and storage; completion failures are
    /// answered with an apology turn instead.
    #[tracing::instrument(name = "send_message", skip_all, fields(user_id = %user_id))]
    pub async fn send_message(
        &self,
        user_id: &UserId,
        raw_message: &str,
    ) -> Result<SendOutcome, ChatError> {
        let message = validate_message(raw_message, self.max_message_chars)?;

        let mut conversation = self.store.get_or_create_active(user_id).await?;
        conversation.push_turn(TurnRole::User, &message);
        debug!(conversation_id = %conversation.id, content = %message, "User turn appended");

        let reply = match self.gateway.complete(&conversation.turns).await {
            Ok(text) => text,
            Err(err) => {
                info!(conversation_id = %conversation.id, error = %err, "Answering with apology");
                apology_for(&err).to_string()
            }
        };
        conversation.push_turn(TurnRole::Assistant, &reply);

        apply_title_rule(&mut conversation);
        self.store.save(&mut conversation).await?;

        info!(
            conversation_id = %conversation.id,
            turn_count = conversation.turn_count(),
            "Chat turn persisted"
        );

        Ok(SendOutcome {
            message: reply,
            chat_id: conversation.id,
            message_count: conversation.turn_count(),
        })
    }
}
