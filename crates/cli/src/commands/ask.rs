//! Ask command handler.
//!
//! Loads (or builds) the index once and answers a single question.

use crate::runtime::Runtime;
use clap::Args;
use std::path::PathBuf;
use tableside_core::{config::AppConfig, AppError, AppResult};

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.get_question()?;

        let runtime = Runtime::new(config)?;
        let generation = runtime.worker.load_or_build().await?;
        tracing::debug!(
            generation = generation.id,
            chunks = generation.chunk_count(),
            "Index ready"
        );

        let assistant = runtime.assistant(config)?;
        let answer = assistant.answer(&question).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("{}", answer.answer);
        }

        Ok(())
    }

    /// Get the question text from the argument or the file.
    fn get_question(&self) -> AppResult<String> {
        if let Some(question) = &self.question {
            return Ok(question.clone());
        }

        match &self.file {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read question file {:?}: {}", path, e))
            }),
            None => Err(AppError::Config("No question provided".to_string())),
        }
    }
}
