//! Completion gateway: turns a conversation's turns into assistant text.
//!
//! The gateway owns the request shape (system instruction first, then the
//! last N turns in original order) and the retry policy. Failure
//! classification happens in the provider; the gateway passes the
//! classified [`CompletionError`] through unchanged.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use supportdesk_types::chat::Turn;
use supportdesk_types::config::{CompletionConfig, MAX_COMPLETION_ATTEMPTS};
use supportdesk_types::llm::{CompletionError, CompletionRequest, Message};

use crate::llm::box_provider::BoxCompletionProvider;

/// Request-shaping and retry settings, resolved from [`CompletionConfig`].
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Number of most recent turns sent as context.
    pub context_turns: usize,
    /// 1 means a single attempt.
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl From<&CompletionConfig> for GatewaySettings {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            context_turns: config.context_turns,
            max_attempts: config.effective_attempts(),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// The last `cap` turns, in original order.
pub fn context_window(turns: &[Turn], cap: usize) -> &[Turn] {
    &turns[turns.len().saturating_sub(cap)..]
}

pub struct CompletionGateway {
    provider: BoxCompletionProvider,
    settings: GatewaySettings,
}

impl CompletionGateway {
    pub fn new(provider: BoxCompletionProvider, settings: GatewaySettings) -> Self {
        Self { provider, settings }
    }

    /// Build the outbound request for a conversation's turns.
    pub fn build_request(&self, turns: &[Turn]) -> CompletionRequest {
        let window = context_window(turns, self.settings.context_turns);

        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(Message::system(self.settings.system_prompt.clone()));
        messages.extend(window.iter().map(|turn| Message {
            role: turn.role.into(),
            content: turn.content.clone(),
        }));

        CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
        }
    }

    /// Complete the conversation. Empty completion text is a failure.
    #[tracing::instrument(
        name = "completion",
        skip(self, turns),
        fields(
            gen_ai.provider.name = %self.provider.name(),
            gen_ai.request.model = %self.settings.model,
            context_turns = tracing::field::Empty,
        )
    )]
    pub async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError> {
        let request = self.build_request(turns);
        tracing::Span::current().record("context_turns", request.messages.len() - 1);

        let attempts = self.settings.max_attempts.clamp(1, MAX_COMPLETION_ATTEMPTS);
        let mut attempt = 1;
        loop {
            let started = Instant::now();
            let result = self
                .provider
                .complete(&request)
                .await
                .and_then(|response| {
                    let text = response.content.trim();
                    if text.is_empty() {
                        Err(CompletionError::no_content())
                    } else {
                        info!(
                            gen_ai.usage.input_tokens = response.usage.input_tokens,
                            gen_ai.usage.output_tokens = response.usage.output_tokens,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Completion received"
                        );
                        Ok(text.to_string())
                    }
                });

            match result {
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!(attempt, error = %err, "Completion failed, retrying");
                    tokio::time::sleep(self.settings.retry_backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "Completion failed");
                    return Err(err);
                }
                Ok(text) => return Ok(text),
            }
        }
    }
}
