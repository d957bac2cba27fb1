//! In-memory test doubles for the core ports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use supportdesk_types::chat::{Conversation, ConversationId, ConversationStatus, ConversationSummary};
use supportdesk_types::error::{AuthError, RepositoryError, TokenRejection};
use supportdesk_types::llm::{CompletionError, CompletionRequest, CompletionResponse, Usage};
use supportdesk_types::user::{User, UserId, UserRecord};

use crate::llm::provider::CompletionProvider;
use crate::repository::conversation::ConversationRepository;
use crate::repository::user::UserRepository;
use crate::service::credential::{PasswordHasher, TokenCodec};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<UserRecord>>,
}

impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, record: &UserRecord) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.user.email == record.user.email) {
            return Err(RepositoryError::Conflict(record.user.email.clone()));
        }
        users.push(record.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| &u.user.id == id)
            .map(|u| u.user.clone()))
    }
}

/// Stores conversations by value and counts writes.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: Mutex<Vec<Conversation>>,
    saves: AtomicUsize,
}

impl InMemoryConversationRepository {
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn all(&self) -> Vec<Conversation> {
        self.conversations.lock().unwrap().clone()
    }
}

impl ConversationRepository for InMemoryConversationRepository {
    async fn find_latest_active(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.lock().unwrap();
        Ok(conversations
            .iter()
            .filter(|c| &c.user_id == user_id && c.is_active())
            .max_by_key(|c| c.updated_at)
            .cloned())
    }

    async fn find_active(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.lock().unwrap();
        Ok(conversations
            .iter()
            .find(|c| &c.id == id && &c.user_id == user_id && c.is_active())
            .cloned())
    }

    async fn list_active(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let conversations = self.conversations.lock().unwrap();
        let mut owned: Vec<&Conversation> = conversations
            .iter()
            .filter(|c| &c.user_id == user_id && c.is_active())
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned
            .into_iter()
            .take(limit as usize)
            .map(Conversation::summary)
            .collect())
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut conversations = self.conversations.lock().unwrap();
        let existing = conversations.iter_mut().find(|c| c.id == conversation.id);
        let stored = existing.as_ref().map_or(0, |c| c.turn_count());
        if stored != conversation.persisted_turns
            || existing.as_ref().is_some_and(|c| c.user_id != conversation.user_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "conversation {} changed since it was loaded",
                conversation.id
            )));
        }

        let mut saved = conversation.clone();
        saved.mark_persisted();
        match existing {
            Some(existing) => *existing = saved,
            None => conversations.push(saved),
        }
        Ok(())
    }

    async fn soft_delete(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        let mut conversations = self.conversations.lock().unwrap();
        match conversations
            .iter_mut()
            .find(|c| &c.id == id && &c.user_id == user_id && c.is_active())
        {
            Some(conversation) => {
                conversation.status = ConversationStatus::Deleted;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Reversible "hash" so tests stay fast.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain${password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain${password}"))
    }
}

/// Tokens are `token:<user id>`; `expired:<user id>` simulates expiry.
pub struct FakeTokenCodec;

impl TokenCodec for FakeTokenCodec {
    fn issue(&self, user_id: &UserId) -> Result<String, AuthError> {
        Ok(format!("token:{user_id}"))
    }

    fn verify(&self, token: &str) -> Result<UserId, TokenRejection> {
        if token.starts_with("expired:") {
            return Err(TokenRejection::Expired);
        }
        token
            .strip_prefix("token:")
            .and_then(|id| id.parse().ok())
            .ok_or(TokenRejection::Malformed)
    }
}

#[derive(Default)]
pub struct ScriptState {
    replies: Mutex<VecDeque<Result<CompletionResponse, CompletionError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptState {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

/// Replays queued results in order; answers "ok" once the queue is empty.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    pub state: Arc<ScriptState>,
}

impl ScriptedProvider {
    pub fn reply(self, content: &str) -> Self {
        self.state
            .replies
            .lock()
            .unwrap()
            .push_back(Ok(response(content)));
        self
    }

    pub fn fail(self, error: CompletionError) -> Self {
        self.state.replies.lock().unwrap().push_back(Err(error));
        self
    }
}

pub fn response(content: &str) -> CompletionResponse {
    CompletionResponse {
        content: content.to_string(),
        model: "test-model".to_string(),
        usage: Usage::default(),
    }
}

impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.state.requests.lock().unwrap().push(request.clone());
        self.state
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(response("ok")))
    }
}
