//! OpenAI-compatible completion provider.
//!
//! Talks to any endpoint that speaks the OpenAI chat-completions protocol,
//! OpenRouter by default. Sends `HTTP-Referer` and `X-Title` attribution
//! headers alongside the bearer key and classifies every failure into a
//! [`CompletionError`] by HTTP status.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use supportdesk_core::llm::provider::CompletionProvider;
use supportdesk_types::config::CompletionConfig;
use supportdesk_types::llm::{CompletionError, CompletionRequest, CompletionResponse, Usage};

use self::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorEnvelope};

/// Non-streaming client for an OpenAI-compatible chat-completions endpoint.
///
/// Does NOT derive Debug so the key can never be printed by accident.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    provider_name: String,
    api_url: String,
    api_key: Option<SecretString>,
    app_url: String,
    app_title: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Unavailable {
                status: None,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| SecretString::from(key.to_string()));

        Ok(Self {
            client,
            provider_name: provider_name_for(&config.api_url).to_string(),
            api_url: config.api_url.clone(),
            api_key,
            app_url: config.app_url.clone(),
            app_title: config.app_title.clone(),
        })
    }

    /// Replace the HTTP client timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, CompletionError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Unavailable {
                status: None,
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(self)
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn to_wire_request(request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        }
    }
}

fn provider_name_for(api_url: &str) -> &'static str {
    if api_url.contains("openrouter.ai") {
        "openrouter"
    } else {
        "openai-compatible"
    }
}

/// Map a non-2xx status and its body to a [`CompletionError`].
pub fn classify_status(status: u16, body: &str) -> CompletionError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        401 => CompletionError::Unauthorized,
        402 => CompletionError::QuotaExceeded,
        429 => CompletionError::RateLimited,
        400 => CompletionError::BadRequest(message),
        _ => CompletionError::Unavailable {
            status: Some(status),
            message,
        },
    }
}

fn transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Unavailable {
            status: None,
            message: format!("HTTP request failed: {e}"),
        }
    }
}

impl CompletionProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let Some(api_key) = &self.api_key else {
            return Err(CompletionError::NotConfigured);
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key.expose_secret())
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_title)
            .json(&Self::to_wire_request(request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), error = %err, "Completion request rejected");
            return Err(err);
        }

        let wire: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::Unavailable {
                    status: Some(status.as_u16()),
                    message: format!("failed to parse response: {e}"),
                }
            }
        })?;

        let content = wire
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(CompletionError::no_content)?;
        let usage = wire
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: wire.model.unwrap_or_else(|| request.model.clone()),
            usage,
        })
    }
}
