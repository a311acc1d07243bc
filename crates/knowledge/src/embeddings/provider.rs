//! Embedding provider trait and factory.

use crate::embeddings::providers::{MockProvider, OllamaEmbeddingProvider, OpenAiEmbeddingProvider};
use askdocs_core::{AppError, AppResult, EmbeddingSettings};
use std::sync::Arc;

/// Default OpenAI embeddings endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default local Ollama endpoint.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Trait for embedding providers.
///
/// Every vector returned by one provider has `dimensions()` elements.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from settings.
///
/// # Errors
/// Returns `AppError::Config` for an unknown provider or a missing API key.
pub fn create_provider(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    tracing::debug!(
        "Creating embedding provider: provider={}, model={}, dimensions={}",
        settings.provider,
        settings.model,
        settings.dimensions
    );

    match settings.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(settings.dimensions))),

        "openai" => {
            let key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AppError::Config(format!(
                    "OpenAI embeddings require an API key (set {})",
                    settings.api_key_env
                ))
            })?;
            let base_url = settings.endpoint.as_deref().unwrap_or(OPENAI_BASE_URL);
            let provider =
                OpenAiEmbeddingProvider::new(base_url, key, &settings.model, settings.dimensions)?;
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let base_url = settings.endpoint.as_deref().unwrap_or(OLLAMA_BASE_URL);
            Ok(Arc::new(OllamaEmbeddingProvider::new(
                base_url,
                &settings.model,
                settings.dimensions,
            )))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, ollama, mock",
            settings.provider
        ))),
    }
}

/// Check a provider response: one vector per input, each of the expected
/// length, with only finite values.
pub fn validate_embeddings(
    provider: &str,
    vectors: &[Vec<f32>],
    expected_count: usize,
    dimensions: usize,
) -> AppResult<()> {
    if vectors.len() != expected_count {
        return Err(AppError::Embedding(format!(
            "{} returned {} embeddings for {} inputs",
            provider,
            vectors.len(),
            expected_count
        )));
    }

    for (i, vector) in vectors.iter().enumerate() {
        if vector.len() != dimensions {
            return Err(AppError::Embedding(format!(
                "{} returned {} dimensions at index {}, expected {}",
                provider,
                vector.len(),
                i,
                dimensions
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Embedding(format!(
                "{} returned a non-finite value at index {}",
                provider, i
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            dimensions: 64,
            ..EmbeddingSettings::default()
        }
    }

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider(&settings("mock"), None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 64);
    }

    #[test]
    fn test_openai_requires_key() {
        let result = create_provider(&settings("openai"), None);
        assert!(matches!(result, Err(AppError::Config(_))));

        let provider = create_provider(&settings("openai"), Some("sk-test")).unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let provider = create_provider(&settings("ollama"), None).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&settings("gguf"), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[test]
    fn test_validate_embeddings() {
        let ok = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        assert!(validate_embeddings("test", &ok, 2, 2).is_ok());

        assert!(matches!(
            validate_embeddings("test", &ok, 3, 2),
            Err(AppError::Embedding(_))
        ));
        assert!(matches!(
            validate_embeddings("test", &ok, 2, 3),
            Err(AppError::Embedding(_))
        ));

        let nan = vec![vec![f32::NAN, 0.0]];
        assert!(matches!(
            validate_embeddings("test", &nan, 1, 2),
            Err(AppError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&settings("mock"), None).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }
}
