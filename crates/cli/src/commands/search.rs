//! Search command handler.
//!
//! Retrieval only: prints the chunks closest to a query without calling the
//! language model.

use super::{describe_source, open_retriever};
use askdocs_core::{config::AppConfig, AppResult};
use askdocs_knowledge::rag::types::{ChunkPreview, EMPTY_QUERY_MESSAGE};
use clap::Args;

/// Show the chunks most similar to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve (default: configured top-k)
    #[arg(short = 'k', long = "limit")]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let query = self.query.trim();
        if query.is_empty() {
            println!("{}", EMPTY_QUERY_MESSAGE);
            return Ok(());
        }

        let k = self.limit.unwrap_or(config.top_k);
        let (retriever, _) = open_retriever(config, false).await?;
        let result = retriever.retrieve(query, k).await?;

        let previews: Vec<ChunkPreview> = result
            .hits
            .iter()
            .map(|hit| ChunkPreview::from_hit(hit, config.preview_chars))
            .collect();

        if self.json {
            super::print_json(&serde_json::json!({
                "query": query,
                "k": k,
                "results": previews,
            }))?;
            return Ok(());
        }

        if previews.is_empty() {
            println!("No matching chunks (index has {} entries).", retriever.index_len());
            return Ok(());
        }

        for preview in &previews {
            println!(
                "[{}] {:.3}  {}",
                preview.rank,
                preview.score,
                describe_source(preview.source.as_deref(), preview.page)
            );
            println!("    {}", preview.text);
        }

        Ok(())
    }
}
