//! Build command handler.
//!
//! Builds the vector index from the data directory, or loads it when it
//! already exists.

use super::open_retriever;
use askdocs_core::{config::AppConfig, AppResult};
use clap::Args;

/// Build (or load) the document index
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Remove any existing index and embed all documents again
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command");
        tracing::debug!("Build options: {:?}", self);

        let (retriever, stats) = open_retriever(config, self.rebuild).await?;

        if self.json {
            super::print_json(&serde_json::json!({
                "loadedExisting": stats.loaded_existing,
                "documentsCount": stats.documents_count,
                "chunksCount": stats.chunks_count,
                "durationSecs": stats.duration_secs,
                "dataDir": config.data_dir,
                "persistDir": config.persist_dir,
            }))?;
        } else if stats.loaded_existing {
            println!(
                "Loaded existing index with {} chunks from {} (use --rebuild to re-embed)",
                retriever.index_len(),
                config.persist_dir.display()
            );
        } else {
            println!(
                "Indexed {} documents ({} chunks) in {:.2}s into {}",
                stats.documents_count,
                stats.chunks_count,
                stats.duration_secs,
                config.persist_dir.display()
            );
        }

        Ok(())
    }
}
