//! CompletionProvider trait definition.
//!
//! The single outbound seam of the system: one request in, one completion
//! (or one classified failure) out. Uses RPITIT for `complete`.

use supportdesk_types::llm::{CompletionError, CompletionRequest, CompletionResponse};

/// Trait for completion API backends (OpenRouter and other OpenAI-compatible
/// endpoints).
///
/// Implementations must classify every failure into a [`CompletionError`]
/// and must not retry on their own; retry policy belongs to the gateway.
///
/// Implementations live in supportdesk-infra (e.g., `OpenAiCompatibleProvider`).
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, CompletionError>> + Send;
}
