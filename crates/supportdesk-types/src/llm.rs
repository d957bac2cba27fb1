//! LLM request/response types for Supportdesk.
//!
//! These types model the data shapes for the completion gateway: the
//! provider-neutral completion request, its response, and the failure
//! taxonomy that the chat orchestrator turns into apology turns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chat::TurnRole;

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

impl From<TurnRole> for MessageRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => MessageRole::User,
            TurnRole::Assistant => MessageRole::Assistant,
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Request to an LLM provider for a completion.
///
/// `messages` already contains the system instruction as its first entry;
/// the gateway builds it that way for OpenAI-compatible APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from an LLM provider for a non-streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// May be empty; the gateway treats empty content as a failure.
    pub content: String,
    pub model: String,
    #[serde(default)]
    pub usage: Usage,
}

/// Token usage for a completion request/response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Classified failures from the completion gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// HTTP 401 from the provider (bad API key).
    #[error("completion service rejected the API key")]
    Unauthorized,

    /// HTTP 402 from the provider (out of credits).
    #[error("completion service quota exceeded")]
    QuotaExceeded,

    /// HTTP 429 from the provider.
    #[error("completion service rate limit exceeded")]
    RateLimited,

    /// HTTP 400 from the provider.
    #[error("invalid request to completion service: {0}")]
    BadRequest(String),

    /// HTTP 503, any other unexpected status, a transport failure, or an
    /// empty completion.
    #[error("completion service unavailable ({}): {message}", status_label(.status))]
    Unavailable {
        status: Option<u16>,
        message: String,
    },

    /// The outbound request exceeded its timeout.
    #[error("completion service timed out")]
    Timeout,

    /// No API key is configured for the completion service.
    #[error("completion service is not configured")]
    NotConfigured,
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no status".to_string(),
    }
}

impl CompletionError {
    /// A successful response that carried no completion text.
    pub fn no_content() -> Self {
        CompletionError::Unavailable {
            status: None,
            message: "no content".to_string(),
        }
    }

    /// Whether an opt-in retry may re-issue the request after this failure.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited
                | CompletionError::Unavailable { .. }
                | CompletionError::Timeout
        )
    }
}
