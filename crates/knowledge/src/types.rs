//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};

/// Text extracted from one corpus file.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUnit {
    /// Extracted text
    pub text: String,

    /// What kind of source produced the text ("csv", "spreadsheet", "jsonl").
    /// Never a path.
    pub provenance: Option<String>,
}

impl DocumentUnit {
    pub fn new(text: impl Into<String>, provenance: Option<&str>) -> Self {
        Self {
            text: text.into(),
            provenance: provenance.map(|p| p.to_string()),
        }
    }
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub source_id: String,
    pub position: u32,
    pub text: String,
}

/// A text chunk with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk identifier, derived from source, position and text
    pub id: String,

    /// Document identifier within the generation (not a path)
    pub source_id: String,

    /// Position within source
    pub position: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// A retrieved chunk plus its similarity score in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Summary of one index generation, for logs, health checks and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Generation id
    pub generation: u64,

    /// Number of documents that produced at least one chunk
    pub documents_count: u32,

    /// Number of chunks in the generation
    pub chunks_count: u32,

    /// Files skipped because extraction failed
    pub skipped_files: u32,

    /// Chunks skipped because embedding failed
    pub skipped_chunks: u32,

    /// Build duration in seconds
    pub duration_secs: f64,
}
