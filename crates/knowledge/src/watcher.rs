//! Polling corpus watcher.

use crate::rebuild::RebuildScheduler;
use crate::snapshot::CorpusSnapshot;
use std::path::PathBuf;
use std::time::Duration;
use tableside_core::config::CorpusSettings;
use tableside_core::AppError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Snapshots the corpus directory on a fixed interval and requests a rebuild
/// whenever the snapshot differs from the last one seen.
#[derive(Debug)]
pub struct CorpusWatcher {
    data_dir: PathBuf,
    extensions: Vec<String>,
    interval: Duration,
    scheduler: RebuildScheduler,
    last_seen: CorpusSnapshot,
}

impl CorpusWatcher {
    /// `last_seen` is the snapshot the published generation was built from.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        settings: &CorpusSettings,
        scheduler: RebuildScheduler,
        last_seen: CorpusSnapshot,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            extensions: settings.extensions.clone(),
            interval: Duration::from_secs(settings.poll_interval_secs.max(1)),
            scheduler,
            last_seen,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll until cancelled. Directory errors are logged and retried on the
    /// next tick.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            dir = %self.data_dir.display(),
            interval_ms = self.interval.as_millis() as u64,
            "Corpus watcher started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.poll().await,
            }
        }

        info!("Corpus watcher stopped");
    }

    async fn poll(&mut self) {
        let dir = self.data_dir.clone();
        let extensions = self.extensions.clone();
        let captured = tokio::task::spawn_blocking(move || CorpusSnapshot::capture(&dir, &extensions))
            .await
            .map_err(|e| AppError::Other(format!("Snapshot task failed: {}", e)))
            .and_then(|r| r);

        match captured {
            Ok(snapshot) if snapshot != self.last_seen => {
                info!(files = snapshot.len(), "Corpus changed, requesting rebuild");
                self.scheduler.request();
                self.last_seen = snapshot;
            }
            Ok(_) => debug!("Corpus unchanged"),
            Err(e) => warn!(error = %e, "Failed to snapshot corpus directory"),
        }
    }
}
