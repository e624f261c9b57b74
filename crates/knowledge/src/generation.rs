//! Immutable index generations and the handle that publishes them.
//!
//! Readers take one `Arc<IndexGeneration>` per query and keep it for the whole
//! request; the rebuild worker replaces the published generation with a
//! single swap. A superseded generation is dropped once its last reader
//! finishes.

use crate::memory_index::MemoryIndex;
use crate::snapshot::CorpusSnapshot;
use crate::types::{Chunk, IndexStats, QueryResult};
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tableside_core::AppResult;
use tokio::sync::watch;

/// A fully built, never mutated index over one corpus snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexGeneration {
    pub id: u64,
    pub built_at: DateTime<Utc>,
    pub snapshot: CorpusSnapshot,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub documents_count: u32,
    pub skipped_files: u32,
    pub skipped_chunks: u32,
    pub duration_secs: f64,
    index: MemoryIndex,
}

impl IndexGeneration {
    pub(crate) fn new(
        snapshot: CorpusSnapshot,
        chunk_size: usize,
        chunk_overlap: usize,
        index: MemoryIndex,
    ) -> Self {
        Self {
            id: 0,
            built_at: Utc::now(),
            snapshot,
            chunk_size,
            chunk_overlap,
            documents_count: 0,
            skipped_files: 0,
            skipped_chunks: 0,
            duration_secs: 0.0,
            index,
        }
    }

    /// The generation published before the first build completes.
    pub fn empty() -> Self {
        Self::new(CorpusSnapshot::default(), 0, 0, MemoryIndex::new())
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<QueryResult>> {
        self.index.search(query_embedding, top_k)
    }

    pub fn chunks(&self) -> &[Chunk] {
        self.index.chunks()
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether this generation was built from `snapshot` with the given
    /// chunking parameters.
    pub fn matches(&self, snapshot: &CorpusSnapshot, chunk_size: usize, chunk_overlap: usize) -> bool {
        self.snapshot == *snapshot
            && self.chunk_size == chunk_size
            && self.chunk_overlap == chunk_overlap
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            generation: self.id,
            documents_count: self.documents_count,
            chunks_count: self.index.len() as u32,
            skipped_files: self.skipped_files,
            skipped_chunks: self.skipped_chunks,
            duration_secs: self.duration_secs,
        }
    }
}

/// Holds the single published generation.
///
/// Cloning the handle shares the same slot. Only the rebuild worker publishes.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    tx: Arc<watch::Sender<Arc<IndexGeneration>>>,
}

impl IndexHandle {
    pub fn new(initial: IndexGeneration) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    /// The currently published generation.
    pub fn current(&self) -> Arc<IndexGeneration> {
        self.tx.borrow().clone()
    }

    /// Swap in `generation`, returning the one it replaced.
    pub fn publish(&self, generation: IndexGeneration) -> Arc<IndexGeneration> {
        let generation = Arc::new(generation);
        tracing::info!(
            generation = generation.id,
            chunks = generation.chunk_count(),
            "Published index generation"
        );
        self.tx.send_replace(generation)
    }
}

impl Default for IndexHandle {
    fn default() -> Self {
        Self::new(IndexGeneration::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation_with(texts: &[&str]) -> IndexGeneration {
        let mut index = MemoryIndex::new();
        for (i, text) in texts.iter().enumerate() {
            index
                .upsert_chunk(Chunk {
                    id: format!("c{}", i),
                    source_id: "doc-0".to_string(),
                    position: i as u32,
                    text: text.to_string(),
                    embedding: vec![1.0, i as f32],
                })
                .unwrap();
        }
        IndexGeneration::new(CorpusSnapshot::default(), 512, 64, index)
    }

    #[test]
    fn test_empty_generation() {
        let generation = IndexGeneration::empty();
        assert_eq!(generation.id, 0);
        assert!(generation.is_empty());
        assert!(generation.search(&[1.0, 0.0], 2).unwrap().is_empty());
    }

    #[test]
    fn test_publish_swaps_whole_generation() {
        let handle = IndexHandle::default();
        let before = handle.current();

        let previous = handle.publish(generation_with(&["Chicken Curry", "Naan"]).with_id(1));

        assert_eq!(previous.id, 0);
        assert_eq!(before.chunk_count(), 0);
        let after = handle.current();
        assert_eq!(after.id, 1);
        assert_eq!(after.chunk_count(), 2);
    }

    #[test]
    fn test_reader_keeps_its_generation() {
        let handle = IndexHandle::default();
        handle.publish(generation_with(&["Lamb Biryani"]).with_id(1));
        let held = handle.current();

        handle.publish(generation_with(&["a", "b", "c"]).with_id(2));

        assert_eq!(held.id, 1);
        assert_eq!(held.chunk_count(), 1);
        assert_eq!(handle.current().chunk_count(), 3);
    }

    #[test]
    fn test_matches_parameters() {
        let generation = generation_with(&["x"]);
        let snapshot = CorpusSnapshot::default();
        assert!(generation.matches(&snapshot, 512, 64));
        assert!(!generation.matches(&snapshot, 256, 64));
        assert!(!generation.matches(&snapshot, 512, 0));
    }

    #[test]
    fn test_stats() {
        let mut generation = generation_with(&["a", "b"]).with_id(3);
        generation.documents_count = 1;
        generation.skipped_files = 2;

        let stats = generation.stats();
        assert_eq!(stats.generation, 3);
        assert_eq!(stats.chunks_count, 2);
        assert_eq!(stats.documents_count, 1);
        assert_eq!(stats.skipped_files, 2);
    }
}
