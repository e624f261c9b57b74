//! Reindex command handler.

use crate::runtime::Runtime;
use clap::Args;
use tableside_core::{config::AppConfig, AppResult};

/// Rebuild and persist the index
#[derive(Args, Debug)]
pub struct ReindexCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReindexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing reindex command");

        let runtime = Runtime::new(config)?;
        let generation = runtime.worker.rebuild().await?;
        let stats = generation.stats();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Reindexed {}", config.data_dir().display());
            println!("  Documents: {}", stats.documents_count);
            println!("  Chunks: {}", stats.chunks_count);
            if stats.skipped_files > 0 || stats.skipped_chunks > 0 {
                println!(
                    "  Skipped: {} files, {} chunks",
                    stats.skipped_files, stats.skipped_chunks
                );
            }
            println!("  Duration: {:.2}s", stats.duration_secs);
        }

        Ok(())
    }
}
