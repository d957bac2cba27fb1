//! Conversation, turn, and summary types for Supportdesk.
//!
//! A conversation is an append-only list of turns owned by one user.
//! Conversations are never physically deleted; a soft delete flips the
//! status to [`ConversationStatus::Deleted`], and every store query filters
//! deleted conversations out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::user::UserId;

/// Placeholder title for conversations that have not been titled yet.
pub const NEW_CHAT_TITLE: &str = "New Chat";

/// Unique identifier for a conversation, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Author of a turn. Only users and the assistant write turns; the system
/// instruction is added by the completion gateway and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// Lifecycle status of a conversation.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('active', 'deleted'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    #[default]
    Active,
    Deleted,
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationStatus::Active => write!(f, "active"),
            ConversationStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ConversationStatus::Active),
            "deleted" => Ok(ConversationStatus::Deleted),
            other => Err(format!("invalid conversation status: '{other}'")),
        }
    }
}

/// A single immutable message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    /// Non-empty, trimmed.
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time. Content is trimmed.
    pub fn new(role: TurnRole, content: impl AsRef<str>) -> Self {
        Self {
            role,
            content: content.as_ref().trim().to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A conversation between one user and the support assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub title: Option<String>,
    /// Insertion-ordered, never reordered.
    pub turns: Vec<Turn>,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// How many of `turns` were in storage when this copy was loaded or last
    /// saved. A save is rejected when storage has moved past it.
    #[serde(skip)]
    pub persisted_turns: usize,
}

impl Conversation {
    /// Start a new, empty, active conversation for a user.
    pub fn new(user_id: UserId, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            user_id,
            title,
            turns: Vec::new(),
            status: ConversationStatus::Active,
            created_at: now,
            updated_at: now,
            persisted_turns: 0,
        }
    }

    /// Append a turn and stamp the updated time.
    pub fn push_turn(&mut self, role: TurnRole, content: impl AsRef<str>) {
        self.turns.push(Turn::new(role, content));
        self.updated_at = Utc::now();
    }

    /// Record that every in-memory turn is now stored.
    pub fn mark_persisted(&mut self) {
        self.persisted_turns = self.turns.len();
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn is_active(&self) -> bool {
        self.status == ConversationStatus::Active
    }

    /// Build the history listing entry for this conversation.
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: display_title(&self.id, self.title.as_deref()),
            message_count: self.turns.len(),
            last_message: self.turns.last().cloned(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Title shown in history listings: the stored title, or `Chat <last 4 chars
/// of id>` for untitled conversations.
pub fn display_title(id: &ConversationId, title: Option<&str>) -> String {
    match title {
        Some(title) => title.to_string(),
        None => {
            let id = id.to_string();
            format!("Chat {}", &id[id.len() - 4..])
        }
    }
}

/// A history listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    /// Falls back to `Chat <last 4 chars of id>` for untitled conversations.
    pub title: String,
    pub message_count: usize,
    pub last_message: Option<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_role_parse() {
        assert_eq!("user".parse::<TurnRole>().unwrap(), TurnRole::User);
        assert_eq!("Assistant".parse::<TurnRole>().unwrap(), TurnRole::Assistant);
        assert!("system".parse::<TurnRole>().is_err());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&ConversationStatus::Deleted).unwrap();
        assert_eq!(json, "\"deleted\"");
        assert_eq!(ConversationStatus::default(), ConversationStatus::Active);
    }

    #[test]
    fn test_turn_content_is_trimmed() {
        let turn = Turn::new(TurnRole::User, "  hi there \n");
        assert_eq!(turn.content, "hi there");
    }

    #[test]
    fn test_push_turn_stamps_updated_at() {
        let mut conversation = Conversation::new(UserId::new(), None);
        let before = conversation.updated_at;
        conversation.push_turn(TurnRole::User, "Hello");
        assert_eq!(conversation.turn_count(), 1);
        assert!(conversation.updated_at >= before);
        assert_eq!(conversation.last_turn().unwrap().content, "Hello");
    }

    #[test]
    fn test_summary_title_fallback_uses_id_suffix() {
        let conversation = Conversation::new(UserId::new(), None);
        let summary = conversation.summary();
        let id = conversation.id.to_string();
        assert_eq!(summary.title, format!("Chat {}", &id[id.len() - 4..]));
        assert_eq!(summary.message_count, 0);
        assert!(summary.last_message.is_none());
    }

    #[test]
    fn test_conversation_serializes_camel_case() {
        let mut conversation = Conversation::new(UserId::new(), Some(NEW_CHAT_TITLE.into()));
        conversation.push_turn(TurnRole::Assistant, "Hi!");
        let json = serde_json::to_value(&conversation).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["turns"][0]["role"], "assistant");
        assert_eq!(json["status"], "active");
    }
}
