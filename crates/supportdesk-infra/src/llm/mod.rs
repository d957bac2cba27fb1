//! Completion provider implementations.
//!
//! Contains the concrete [`CompletionProvider`](supportdesk_core::llm::provider::CompletionProvider)
//! used in production and the factory ([`create_provider`]) that builds it
//! from [`CompletionConfig`].

pub mod openai_compat;

use supportdesk_core::llm::box_provider::BoxCompletionProvider;
use supportdesk_types::config::CompletionConfig;
use supportdesk_types::llm::CompletionError;

use self::openai_compat::OpenAiCompatibleProvider;

/// Build the completion provider for the configured endpoint.
///
/// A missing API key is not an error here: the provider is still built and
/// fails every call with [`CompletionError::NotConfigured`], so chat keeps
/// answering with an apology instead of refusing to start.
pub fn create_provider(config: &CompletionConfig) -> Result<BoxCompletionProvider, CompletionError> {
    if !config.has_api_key() {
        tracing::warn!("No completion API key configured; chat replies will be apologies");
    }
    let provider = OpenAiCompatibleProvider::new(config)?;
    tracing::info!(
        provider = provider.provider_name(),
        model = %config.model,
        "Completion provider ready"
    );
    Ok(BoxCompletionProvider::new(provider))
}
