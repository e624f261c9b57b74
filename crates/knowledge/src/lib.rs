//! Corpus indexing for Tableside.
//!
//! Extracts and chunks the corpus, embeds the chunks, and keeps one immutable
//! index generation published at a time. A polling watcher and a single
//! rebuild worker keep the published generation in step with the corpus
//! directory.

pub mod builder;
pub mod chunker;
pub mod embeddings;
pub mod extract;
pub mod generation;
pub mod memory_index;
pub mod rebuild;
pub mod snapshot;
pub mod storage;
pub mod types;
pub mod vector_index;
pub mod watcher;

pub use builder::IndexBuilder;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use generation::{IndexGeneration, IndexHandle};
pub use rebuild::{RebuildScheduler, RebuildSignals, RebuildWorker};
pub use snapshot::CorpusSnapshot;
pub use storage::GenerationStore;
pub use types::{Chunk, DocumentUnit, IndexStats, QueryResult};
pub use watcher::CorpusWatcher;

#[cfg(test)]
mod tests;
