//! Serve command handler.
//!
//! Publishes an initial generation, then runs the corpus watcher, the
//! rebuild worker and the HTTP server until Ctrl-C.

use crate::runtime::Runtime;
use clap::Args;
use std::sync::Arc;
use tableside_core::{config::AppConfig, AppResult};
use tableside_knowledge::{CorpusWatcher, RebuildScheduler};
use tableside_server::{serve, AppState};
use tokio_util::sync::CancellationToken;

/// Serve the assistant over HTTP
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Host to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not watch the corpus for changes
    #[arg(long)]
    pub no_watch: bool,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");
        tracing::debug!("Serve options: {:?}", self);

        let runtime = Runtime::new(config)?;

        // A failed first build still serves, answering from an empty index
        if let Err(e) = runtime.worker.load_or_build().await {
            tracing::warn!(error = %e, "Initial index build failed, starting with an empty index");
        }

        let cancel = CancellationToken::new();
        let (scheduler, signals) = RebuildScheduler::new();
        let mut tasks = vec![tokio::spawn(
            runtime.worker.clone().run(signals, cancel.clone()),
        )];

        if self.no_watch {
            tracing::info!("Corpus watching disabled");
        } else {
            let watcher = CorpusWatcher::new(
                config.data_dir(),
                &config.corpus,
                scheduler,
                runtime.handle.current().snapshot.clone(),
            );
            tasks.push(tokio::spawn(watcher.run(cancel.clone())));
        }

        let shutdown = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown requested"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
            }
            shutdown.cancel();
        });

        let state = AppState::new(Arc::new(runtime.assistant(config)?), runtime.handle.clone());
        let addr = format!(
            "{}:{}",
            self.host.as_deref().unwrap_or(&config.server.host),
            self.port.unwrap_or(config.server.port)
        );

        let result = serve(&addr, state, &config.server.cors_origins, cancel.clone()).await;

        // Stop background work whether the server exited cleanly or not
        cancel.cancel();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }

        result
    }
}
