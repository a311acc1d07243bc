//! Stats command handler.
//!
//! Shows statistics of the persisted index.

use askdocs_core::{config::AppConfig, AppResult};
use clap::Args;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = askdocs_knowledge::stats(config)?;

        if self.json {
            super::print_json(&serde_json::json!({
                "persistDir": stats.persist_dir,
                "entriesCount": stats.entries_count,
                "sourcesCount": stats.sources_count,
                "provider": stats.provider,
                "model": stats.model,
                "dimensions": stats.dimensions,
                "chunkSize": stats.chunk_size,
                "chunkOverlap": stats.chunk_overlap,
                "dbSizeBytes": stats.db_size_bytes,
                "builtAt": stats.built_at.to_rfc3339(),
            }))?;
        } else {
            println!("Index: {}", stats.persist_dir.display());
            println!("  Chunks: {}", stats.entries_count);
            println!("  Sources: {}", stats.sources_count);
            println!(
                "  Embeddings: {}/{} ({} dimensions)",
                stats.provider, stats.model, stats.dimensions
            );
            println!(
                "  Chunking: size {}, overlap {}",
                stats.chunk_size, stats.chunk_overlap
            );
            println!("  DB size: {} bytes", stats.db_size_bytes);
            println!("  Built at: {}", stats.built_at.to_rfc3339());
        }

        Ok(())
    }
}
