//! Builds index generations from the corpus directory.

use crate::chunker::chunk_text;
use crate::embeddings::EmbeddingProvider;
use crate::extract::extract;
use crate::generation::IndexGeneration;
use crate::memory_index::MemoryIndex;
use crate::snapshot::CorpusSnapshot;
use crate::types::{Chunk, ChunkCandidate};
use crate::vector_index::VectorIndex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tableside_core::config::{CorpusSettings, IndexSettings};
use tableside_core::{AppError, AppResult};
use tracing::{debug, info, instrument, warn};

/// Turns a corpus snapshot into a new generation: extract, chunk, embed.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    data_dir: PathBuf,
    extensions: Vec<String>,
    chunk_size: usize,
    chunk_overlap: usize,
    provider: Arc<dyn EmbeddingProvider>,
}

impl IndexBuilder {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        corpus: &CorpusSettings,
        index: &IndexSettings,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            extensions: corpus.extensions.clone(),
            chunk_size: index.chunk_size,
            chunk_overlap: index.chunk_overlap,
            provider,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn chunk_params(&self) -> (usize, usize) {
        (self.chunk_size, self.chunk_overlap)
    }

    /// Snapshot the corpus directory off the async runtime.
    pub async fn capture_snapshot(&self) -> AppResult<CorpusSnapshot> {
        let dir = self.data_dir.clone();
        let extensions = self.extensions.clone();
        tokio::task::spawn_blocking(move || CorpusSnapshot::capture(&dir, &extensions))
            .await
            .map_err(|e| AppError::Other(format!("Snapshot task failed: {}", e)))?
    }

    /// Build a generation covering every file in `snapshot`.
    ///
    /// Files that fail extraction and chunks that fail embedding are skipped.
    /// Only an empty corpus yields an empty generation; files that produce no
    /// indexed chunk at all are a `Build` error. The returned generation has id 0 and
    /// is stamped by the publisher.
    #[instrument(skip(self, snapshot), fields(files = snapshot.len()))]
    pub async fn build(&self, snapshot: CorpusSnapshot) -> AppResult<IndexGeneration> {
        let started = Instant::now();

        let file_count = snapshot.len();
        let paths = snapshot.paths(&self.data_dir);
        let (candidates, documents_count, skipped_files) = self.collect_candidates(paths).await?;

        let mut index = MemoryIndex::new();
        let mut skipped_chunks = 0u32;

        for candidate in &candidates {
            match self.provider.embed(&candidate.text).await {
                Ok(embedding) => index.upsert_chunk(Chunk {
                    id: chunk_id(candidate),
                    source_id: candidate.source_id.clone(),
                    position: candidate.position,
                    text: candidate.text.clone(),
                    embedding,
                })?,
                Err(e) => {
                    warn!(
                        error = %e,
                        source = %candidate.source_id,
                        position = candidate.position,
                        "Skipping chunk that failed to embed"
                    );
                    skipped_chunks += 1;
                }
            }
        }

        if file_count > 0 && index.is_empty() {
            let reason = if candidates.is_empty() {
                format!("No chunks extracted from {} files", file_count)
            } else {
                format!("All {} chunks failed to embed", candidates.len())
            };
            return Err(AppError::Build(reason));
        }

        let mut generation =
            IndexGeneration::new(snapshot, self.chunk_size, self.chunk_overlap, index);
        generation.documents_count = documents_count;
        generation.skipped_files = skipped_files;
        generation.skipped_chunks = skipped_chunks;
        generation.duration_secs = started.elapsed().as_secs_f64();

        info!(
            documents = documents_count,
            chunks = generation.chunk_count(),
            skipped_files,
            skipped_chunks,
            "Built index generation in {:.2}s",
            generation.duration_secs
        );

        Ok(generation)
    }

    async fn collect_candidates(
        &self,
        paths: Vec<PathBuf>,
    ) -> AppResult<(Vec<ChunkCandidate>, u32, u32)> {
        let chunk_size = self.chunk_size;
        let chunk_overlap = self.chunk_overlap;

        tokio::task::spawn_blocking(move || {
            let mut candidates = Vec::new();
            let mut documents_count = 0u32;
            let mut skipped_files = 0u32;

            for (ordinal, path) in paths.iter().enumerate() {
                let document = match extract(path) {
                    Ok(document) => document,
                    Err(e) => {
                        warn!(error = %e, "Skipping corpus file");
                        skipped_files += 1;
                        continue;
                    }
                };

                let source_id = format!("doc-{}", ordinal);
                let chunks = chunk_text(&source_id, &document.text, chunk_size, chunk_overlap);
                debug!(
                    source = %source_id,
                    kind = document.provenance.as_deref().unwrap_or("unknown"),
                    chunks = chunks.len(),
                    "Extracted document"
                );

                if !chunks.is_empty() {
                    documents_count += 1;
                }
                candidates.extend(chunks);
            }

            (candidates, documents_count, skipped_files)
        })
        .await
        .map_err(|e| AppError::Build(format!("Extraction task failed: {}", e)))
    }
}

/// Deterministic chunk id from source, position and text.
fn chunk_id(candidate: &ChunkCandidate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(candidate.source_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(candidate.position.to_be_bytes());
    hasher.update(candidate.text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..32].to_string()
}
