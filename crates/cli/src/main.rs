//! AskDocs CLI
//!
//! Main entry point for the askdocs command-line tool.
//! Builds a local vector index over a folder of documents and answers
//! questions grounded in it.

mod commands;

use askdocs_core::{
    config::{AppConfig, ConfigOverrides},
    logging, AppResult,
};
use clap::{Parser, Subcommand};
use commands::{AskCommand, BuildCommand, SearchCommand, StatsCommand};
use std::path::PathBuf;

/// AskDocs - ask questions about your documents
#[derive(Parser, Debug)]
#[command(name = "askdocs")]
#[command(about = "Question answering over a local document index", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "ASKDOCS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "ASKDOCS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the source documents
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory holding the persisted index
    #[arg(long, global = true)]
    persist_dir: Option<PathBuf>,

    /// Number of chunks retrieved per question
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Generation model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output (also set by `NO_COLOR=1`)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the index from the data directory (or load it if present)
    Build(BuildCommand),

    /// Ask a question about the documents
    Ask(AskCommand),

    /// Show the chunks most similar to a query
    Search(SearchCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration: defaults, config file, environment
    let config = AppConfig::load(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(ConfigOverrides {
        data_dir: cli.data_dir,
        persist_dir: cli.persist_dir,
        top_k: cli.top_k,
        model: cli.model,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("AskDocs CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Data dir: {:?}", config.data_dir);
    tracing::debug!("Index dir: {:?}", config.persist_dir);
    tracing::debug!(
        "Embedding: {}/{}, generation: {}/{}",
        config.embedding.provider,
        config.embedding.model,
        config.generation.provider,
        config.generation.model
    );

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Build(_) => "build",
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
