//! Command handlers for the AskDocs CLI.
//!
//! Every command that reads the index goes through [`open_retriever`] or
//! [`open_pipeline`], which build or load the index once before any query
//! runs.

pub mod ask;
pub mod build;
pub mod search;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use build::BuildCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;

use askdocs_core::{config::AppConfig, AppResult};
use askdocs_knowledge::{
    build_or_load, create_provider, BuildStats, PipelineOptions, QueryPipeline, Retriever,
};
use askdocs_llm::create_client;
use askdocs_prompt::PromptComposer;
use std::sync::Arc;

/// Build or load the index and wrap it in a retriever.
pub(crate) async fn open_retriever(
    config: &AppConfig,
    rebuild: bool,
) -> AppResult<(Retriever, BuildStats)> {
    let api_key = config.embedding_api_key();
    let embedder = create_provider(&config.embedding, api_key.as_deref())?;

    let (index, stats) = build_or_load(config, embedder.as_ref(), rebuild).await?;
    Ok((Retriever::new(embedder, Arc::new(index)), stats))
}

/// Build or load the index and assemble the full query pipeline.
pub(crate) async fn open_pipeline(config: &AppConfig) -> AppResult<QueryPipeline> {
    // Generation settings are checked before any index build starts.
    let api_key = config.generation_api_key();
    let llm = create_client(
        &config.generation.provider,
        config.generation.endpoint.as_deref(),
        api_key.as_deref(),
    )?;
    let composer = PromptComposer::from_file(config.prompt_file.as_deref(), config.context_chars)?;

    let (retriever, stats) = open_retriever(config, false).await?;
    tracing::debug!(
        "Index ready: {} chunks (loaded existing: {})",
        stats.chunks_count,
        stats.loaded_existing
    );

    Ok(QueryPipeline::new(
        Arc::new(retriever),
        llm,
        Arc::new(composer),
        PipelineOptions::from_config(config),
    ))
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Describe where a chunk came from, e.g. `data/guide.pdf (page 3)`.
pub(crate) fn describe_source(source: Option<&str>, page: Option<u64>) -> String {
    let source = source.unwrap_or("(unknown source)");
    match page {
        Some(page) => format!("{} (page {})", source, page),
        None => source.to_string(),
    }
}
