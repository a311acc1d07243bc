//! Ask command handler.
//!
//! Answers questions from the indexed documents, one at a time or
//! interactively from stdin.

use super::{describe_source, open_pipeline};
use askdocs_core::{config::AppConfig, AppError, AppResult};
use askdocs_knowledge::{QueryPipeline, QueryResponse};
use clap::Args;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Ask a question about the indexed documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    #[arg(required_unless_present = "interactive")]
    pub query: Option<String>,

    /// Read one question per line from stdin until EOF or "exit"
    #[arg(short, long, conflicts_with = "query")]
    pub interactive: bool,

    /// Hide the retrieved chunk previews
    #[arg(long)]
    pub no_sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let pipeline = open_pipeline(config).await?;

        if self.interactive {
            return self.run_interactive(&pipeline).await;
        }

        let query = self
            .query
            .as_deref()
            .ok_or_else(|| AppError::Config("No question provided".to_string()))?;

        let response = pipeline.answer(query).await;
        self.print_response(&response)
    }

    async fn run_interactive(&self, pipeline: &QueryPipeline) -> AppResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            if !self.json {
                print!("> ");
                std::io::stdout().flush()?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let line = line.trim();
            if matches!(line, "exit" | "quit") {
                break;
            }

            let response = pipeline.answer(line).await;
            self.print_response(&response)?;
        }

        Ok(())
    }

    fn print_response(&self, response: &QueryResponse) -> AppResult<()> {
        tracing::debug!(
            "Query status: {}, {} previews",
            response.status.as_str(),
            response.previews.len()
        );

        if self.json {
            // One compact document per line so interactive output stays parseable.
            let json = if self.interactive {
                serde_json::to_string(response)?
            } else {
                serde_json::to_string_pretty(response)?
            };
            println!("{}", json);
            return Ok(());
        }

        if !self.no_sources && !response.previews.is_empty() {
            println!("Relevant chunks:");
            for preview in &response.previews {
                println!(
                    "[{}] {} (score {:.3})",
                    preview.rank,
                    describe_source(preview.source.as_deref(), preview.page),
                    preview.score
                );
                println!("    {}", preview.text);
            }
            println!();
        }

        if response.is_answered() {
            println!("Answer:");
        }
        println!("{}", response.answer);

        Ok(())
    }
}
