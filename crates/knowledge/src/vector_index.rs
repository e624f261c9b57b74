//! Vector index abstraction for knowledge chunks.
//!
//! Defines a trait for backend-agnostic vector storage and retrieval.

use crate::types::{Chunk, QueryResult};
use tableside_core::AppResult;

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Upserting chunks with embeddings
/// - Searching for similar vectors (top-k)
/// - Resetting/clearing the index
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a chunk, keyed by its id.
    fn upsert_chunk(&mut self, chunk: Chunk) -> AppResult<()>;

    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns results ordered by descending score, scores in [0, 1].
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<QueryResult>>;

    /// Number of chunks in the index.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine similarity clamped to [0, 1].
///
/// Mismatched lengths and zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(0.0, 1.0)
}
