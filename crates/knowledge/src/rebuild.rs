//! Single rebuild worker with coalescing change signals.
//!
//! The scheduler owns a one-slot channel. A signal sent while the slot is
//! full is dropped, so any number of change notifications arriving during a
//! build collapse into exactly one follow-up build.

use crate::builder::IndexBuilder;
use crate::generation::{IndexGeneration, IndexHandle};
use crate::snapshot::CorpusSnapshot;
use crate::storage::GenerationStore;
use std::sync::Arc;
use tableside_core::AppResult;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Non-blocking, coalescing rebuild trigger.
#[derive(Debug, Clone)]
pub struct RebuildScheduler {
    tx: mpsc::Sender<()>,
}

/// Receiving side of the scheduler, owned by the worker.
#[derive(Debug)]
pub struct RebuildSignals {
    rx: mpsc::Receiver<()>,
}

impl RebuildScheduler {
    pub fn new() -> (Self, RebuildSignals) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, RebuildSignals { rx })
    }

    /// Ask for a rebuild. Returns `false` when a rebuild is already pending
    /// and this request was folded into it.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Rebuild already pending, coalescing request");
                false
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("Rebuild worker has stopped, dropping request");
                false
            }
        }
    }
}

/// Builds, persists and publishes generations.
#[derive(Debug, Clone)]
pub struct RebuildWorker {
    builder: Arc<IndexBuilder>,
    store: Option<GenerationStore>,
    handle: IndexHandle,
}

impl RebuildWorker {
    pub fn new(builder: Arc<IndexBuilder>, store: Option<GenerationStore>, handle: IndexHandle) -> Self {
        Self {
            builder,
            store,
            handle,
        }
    }

    pub fn handle(&self) -> &IndexHandle {
        &self.handle
    }

    /// Publish the persisted generation if it still describes the corpus,
    /// otherwise build a fresh one.
    pub async fn load_or_build(&self) -> AppResult<Arc<IndexGeneration>> {
        let snapshot = self.builder.capture_snapshot().await?;
        let (chunk_size, chunk_overlap) = self.builder.chunk_params();

        if let Some(store) = &self.store {
            match store.load() {
                Ok(Some(stored)) if stored.matches(&snapshot, chunk_size, chunk_overlap) => {
                    info!(
                        chunks = stored.chunk_count(),
                        "Reusing persisted index generation"
                    );
                    return Ok(self.publish(stored));
                }
                Ok(Some(_)) => debug!("Persisted generation is stale"),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Ignoring unreadable persisted generation"),
            }
        }

        self.rebuild_with(snapshot).await
    }

    /// Build from the current corpus unconditionally.
    pub async fn rebuild(&self) -> AppResult<Arc<IndexGeneration>> {
        let snapshot = self.builder.capture_snapshot().await?;
        self.rebuild_with(snapshot).await
    }

    /// Build unless the corpus is unchanged since the published generation.
    /// Returns the newly published generation, if any.
    pub async fn rebuild_if_changed(&self) -> AppResult<Option<Arc<IndexGeneration>>> {
        let snapshot = self.builder.capture_snapshot().await?;
        let current = self.handle.current();
        let (chunk_size, chunk_overlap) = self.builder.chunk_params();

        if current.id > 0 && current.matches(&snapshot, chunk_size, chunk_overlap) {
            debug!(generation = current.id, "Corpus unchanged, skipping rebuild");
            return Ok(None);
        }

        self.rebuild_with(snapshot).await.map(Some)
    }

    async fn rebuild_with(&self, snapshot: CorpusSnapshot) -> AppResult<Arc<IndexGeneration>> {
        let generation = self.builder.build(snapshot).await?;

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&generation) {
                warn!(error = %e, "Failed to persist index generation");
            }
        }

        Ok(self.publish(generation))
    }

    fn publish(&self, generation: IndexGeneration) -> Arc<IndexGeneration> {
        let id = self.handle.current().id + 1;
        self.handle.publish(generation.with_id(id));
        self.handle.current()
    }

    /// Consume rebuild signals until cancelled. Failed builds are logged and
    /// leave the published generation in place.
    pub async fn run(self, mut signals: RebuildSignals, cancel: CancellationToken) {
        info!("Rebuild worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                signal = signals.rx.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    match self.rebuild_if_changed().await {
                        Ok(Some(generation)) => debug!(generation = generation.id, "Rebuild complete"),
                        Ok(None) => {}
                        Err(e) => warn!(
                            error = %e,
                            generation = self.handle.current().id,
                            "Rebuild failed, keeping previous generation"
                        ),
                    }
                }
            }
        }

        info!("Rebuild worker stopped");
    }
}
