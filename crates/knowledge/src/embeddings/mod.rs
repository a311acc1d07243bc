//! Embedding gateway.
//!
//! Provider-agnostic text embedding: the trait, the concrete providers and
//! batching for index builds.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, validate_embeddings, EmbeddingProvider};
pub use providers::{MockProvider, OllamaEmbeddingProvider, OpenAiEmbeddingProvider};

use askdocs_core::AppResult;

/// Embed `texts` in groups of at most `batch_size`, preserving order.
///
/// Used during index builds where the chunk count can exceed what one
/// provider request accepts.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = batch_size.max(1);
    let batches = texts.len().div_ceil(batch_size);

    tracing::info!(
        "Embedding {} texts in {} batches using provider '{}' (model: {})",
        texts.len(),
        batches,
        provider.provider_name(),
        provider.model_name()
    );

    let mut embeddings = Vec::with_capacity(texts.len());
    for (i, batch) in texts.chunks(batch_size).enumerate() {
        let vectors = provider.embed_batch(batch).await?;
        validate_embeddings(
            provider.provider_name(),
            &vectors,
            batch.len(),
            provider.dimensions(),
        )?;
        embeddings.extend(vectors);
        tracing::debug!("Embedded batch {}/{}", i + 1, batches);
    }

    Ok(embeddings)
}
