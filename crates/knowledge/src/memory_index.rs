//! In-memory vector index, serialized with its generation.

use crate::types::{Chunk, QueryResult};
use crate::vector_index::{cosine_similarity, VectorIndex};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tableside_core::{AppError, AppResult};

/// Brute-force cosine index over a flat list of chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryIndex {
    dimensions: Option<usize>,
    chunks: Vec<Chunk>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

impl VectorIndex for MemoryIndex {
    fn upsert_chunk(&mut self, chunk: Chunk) -> AppResult<()> {
        match self.dimensions {
            Some(dim) if dim != chunk.embedding.len() => {
                return Err(AppError::Build(format!(
                    "Chunk embedding dimension mismatch: expected {}, got {}",
                    dim,
                    chunk.embedding.len()
                )));
            }
            None => self.dimensions = Some(chunk.embedding.len()),
            _ => {}
        }

        if let Some(existing) = self.chunks.iter_mut().find(|c| c.id == chunk.id) {
            *existing = chunk;
        } else {
            self.chunks.push(chunk);
        }
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<QueryResult>> {
        let Some(dim) = self.dimensions else {
            return Ok(vec![]);
        };

        if query_embedding.len() != dim {
            return Err(AppError::Retrieval(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                dim,
                query_embedding.len()
            )));
        }

        let mut results: Vec<QueryResult> = self
            .chunks
            .iter()
            .map(|chunk| QueryResult {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        results.truncate(top_k);

        Ok(results)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            source_id: "doc-0".to_string(),
            position: 0,
            text: format!("text of {}", id),
            embedding,
        }
    }

    #[test]
    fn test_search_ranks_by_score() {
        let mut index = MemoryIndex::new();
        index.upsert_chunk(chunk("a", vec![1.0, 0.0])).unwrap();
        index.upsert_chunk(chunk("b", vec![0.6, 0.8])).unwrap();
        index.upsert_chunk(chunk("c", vec![0.0, 1.0])).unwrap();

        let results = index.search(&[0.0, 1.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "c");
        assert_eq!(results[1].chunk.id, "b");
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = MemoryIndex::new();
        assert!(index.search(&[1.0, 2.0, 3.0], 5).unwrap().is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_upsert_replaces_same_id() {
        let mut index = MemoryIndex::new();
        index.upsert_chunk(chunk("a", vec![1.0, 0.0])).unwrap();
        index.upsert_chunk(chunk("a", vec![0.0, 1.0])).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.chunks()[0].embedding, vec![0.0, 1.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = MemoryIndex::new();
        index.upsert_chunk(chunk("a", vec![1.0, 0.0])).unwrap();

        assert!(matches!(
            index.upsert_chunk(chunk("b", vec![1.0])),
            Err(AppError::Build(_))
        ));
        assert!(matches!(index.search(&[1.0], 1), Err(AppError::Retrieval(_))));
    }
}
