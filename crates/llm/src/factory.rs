//! Completion client factory.
//!
//! Resolves the configured provider name to a client implementation,
//! filling in the default endpoint and checking that a key is present
//! for providers that need one.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiCompatClient};
use crate::types::ProviderType;
use askdocs_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a completion client for `provider`.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "openai", "ollama")
/// * `endpoint` - Optional base URL overriding the provider default
/// * `api_key` - API key, required by every provider except Ollama
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required key
/// is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown generation provider: {}", provider)))?;

    let base_url = endpoint.unwrap_or_else(|| provider_type.default_base_url());
    tracing::debug!("Creating {} client for {}", provider_type.as_str(), base_url);

    let key = match api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => key,
        None if provider_type.requires_api_key() => {
            return Err(AppError::Config(format!(
                "{} provider requires an API key",
                provider_type.as_str()
            )));
        }
        None => "",
    };

    match provider_type {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_base_url(base_url))),
        ProviderType::Groq | ProviderType::OpenAI => {
            let client = OpenAiCompatClient::new(provider_type.as_str(), base_url, key)?;
            Ok(Arc::new(client))
        }
    }
}
