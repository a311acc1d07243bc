//! Document knowledge base.
//!
//! Loads documents, splits them into chunks, embeds and persists them in a
//! local vector index, and answers questions grounded in the closest chunks.

pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod rag;
pub mod retriever;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::ChunkSplitter;
pub use embeddings::{create_provider, EmbeddingProvider, MockProvider};
pub use loader::{load_documents, DocumentFormat};
pub use rag::{ChunkPreview, PipelineOptions, QueryPipeline, QueryResponse, QueryStatus};
pub use retriever::Retriever;
pub use store::{SqliteVectorIndex, VectorSearch};
pub use types::{
    BuildStats, Chunk, Document, IndexStats, Metadata, RetrievalResult, SearchHit,
};

use askdocs_core::{AppConfig, AppError, AppResult};
use std::fs;
use std::time::Instant;
use store::BuildOptions;

/// Load the persisted index, or build it from `config.data_dir` when
/// `config.persist_dir` is absent or empty.
///
/// With `rebuild`, any existing index is removed first.
///
/// # Errors
/// Any load, embedding or persistence failure is returned; the caller
/// cannot serve queries without an index.
pub async fn build_or_load(
    config: &AppConfig,
    provider: &dyn EmbeddingProvider,
    rebuild: bool,
) -> AppResult<(SqliteVectorIndex, BuildStats)> {
    let start = Instant::now();
    let persist_dir = &config.persist_dir;

    if rebuild && persist_dir.exists() {
        tracing::info!("Removing existing index at {:?}", persist_dir);
        fs::remove_dir_all(persist_dir).map_err(|e| {
            AppError::Index(format!("Failed to remove {:?}: {}", persist_dir, e))
        })?;
    }

    if SqliteVectorIndex::is_built(persist_dir) {
        let index = SqliteVectorIndex::open(persist_dir, provider)?;

        if let Some(manifest) = index.manifest() {
            if manifest.chunk_size != config.chunk_size
                || manifest.chunk_overlap != config.chunk_overlap
            {
                tracing::warn!(
                    "Index was built with chunk size {}/overlap {}, configured {}/{}; use --rebuild to apply",
                    manifest.chunk_size,
                    manifest.chunk_overlap,
                    config.chunk_size,
                    config.chunk_overlap
                );
            }
        }

        let stats = BuildStats {
            loaded_existing: true,
            documents_count: 0,
            chunks_count: index.len(),
            duration_secs: start.elapsed().as_secs_f64(),
        };
        return Ok((index, stats));
    }

    tracing::info!(
        "Building index from {:?} into {:?}",
        config.data_dir,
        persist_dir
    );

    let splitter = ChunkSplitter::new(config.chunk_size, config.chunk_overlap)?;
    let documents = load_documents(&config.data_dir)?.collect::<AppResult<Vec<_>>>()?;
    let documents_count = documents.len();
    let chunks = splitter.split_documents(documents);

    let options = BuildOptions {
        chunk_size: splitter.size(),
        chunk_overlap: splitter.overlap(),
        batch_size: config.embedding.batch_size,
    };
    let index = SqliteVectorIndex::build(persist_dir, chunks, provider, options).await?;

    let duration = start.elapsed();

    tracing::info!(
        "Index build completed: {} documents, {} chunks in {:.2}s",
        documents_count,
        index.len(),
        duration.as_secs_f64()
    );

    let stats = BuildStats {
        loaded_existing: false,
        documents_count,
        chunks_count: index.len(),
        duration_secs: duration.as_secs_f64(),
    };
    Ok((index, stats))
}

/// Statistics of the index persisted under `config.persist_dir`.
pub fn stats(config: &AppConfig) -> AppResult<IndexStats> {
    store::stats(&config.persist_dir)
}
