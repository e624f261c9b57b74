//! Tableside CLI
//!
//! Main entry point for the tableside command-line tool: serve the menu
//! assistant over HTTP, ask it one question, or rebuild the index.

mod commands;
mod runtime;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ReindexCommand, ServeCommand};
use std::path::PathBuf;
use tableside_core::{config::AppConfig, logging, AppResult};
use tracing::Instrument;

/// Tableside - a menu assistant grounded in your restaurant's own data
#[derive(Parser, Debug)]
#[command(name = "tableside")]
#[command(about = "A menu assistant grounded in your restaurant's own data", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "TABLESIDE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "TABLESIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "TABLESIDE_MODEL")]
    model: Option<String>,

    /// Corpus directory (relative paths resolve against the workspace)
    #[arg(short, long, global = true, env = "TABLESIDE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the assistant over HTTP and keep the index in step with the corpus
    Serve(ServeCommand),

    /// Answer a single question
    Ask(AskCommand),

    /// Rebuild and persist the index
    Reindex(ReindexCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration from the workspace, then apply CLI overrides
    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.data_dir,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.log_json,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Tableside starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Corpus: {:?}", config.data_dir());
    tracing::debug!("Model: {}", config.llm.model);

    config.validate()?;
    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Reindex(_) => "reindex",
    };
    let span = tracing::info_span!("command", name = command_name);

    // Route to command handlers
    let result = async {
        match cli.command {
            Commands::Serve(cmd) => cmd.execute(&config).await,
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Reindex(cmd) => cmd.execute(&config).await,
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
