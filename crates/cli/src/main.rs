//! askdoc CLI
//!
//! Ask natural-language questions about a single document from the
//! terminal, either one-shot or as an interactive chat. Documents are
//! plain text with form-feed page separators; retrieval and answering
//! happen in the askdoc-retrieval crate.

mod commands;
mod extract;

use askdoc_core::{config::AppConfig, logging, AppResult};
use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand};
use std::path::PathBuf;

/// askdoc - ask questions to a document
#[derive(Parser, Debug)]
#[command(name = "askdoc")]
#[command(about = "Ask questions to a document with embedding retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to load
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Verbose output (raises logging to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Turn off colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generative provider (ollama, openai)
    #[arg(short, long, global = true, env = "ASKDOC_PROVIDER")]
    provider: Option<String>,

    /// Generative model identifier
    #[arg(short, long, global = true, env = "ASKDOC_MODEL")]
    model: Option<String>,

    /// Embedding provider (ollama, openai, mock)
    #[arg(long, global = true, env = "ASKDOC_EMBEDDING_PROVIDER")]
    embedding_provider: Option<String>,

    /// Embedding model identifier
    #[arg(long, global = true, env = "ASKDOC_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Endpoint override for the generative provider
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question about a document
    Ask(AskCommand),

    /// Chat interactively with a document
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load .env secrets before clap resolves env-backed flags
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load base configuration, then apply CLI overrides
    let config = AppConfig::load(cli.config.clone())?;
    let config = config.with_overrides(
        cli.provider,
        cli.model,
        cli.embedding_provider,
        cli.embedding_model,
        cli.endpoint,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("askdoc starting");
    tracing::debug!("Provider: {} ({})", config.provider, config.model);
    tracing::debug!(
        "Embedding: {} ({})",
        config.embedding_provider,
        config.embedding_model
    );

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
