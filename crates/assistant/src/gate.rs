//! Confidence-gated retrieval.

use std::sync::Arc;
use tableside_core::config::RetrievalSettings;
use tableside_core::{AppError, AppResult};
use tableside_knowledge::{EmbeddingProvider, IndexHandle, QueryResult};
use tracing::{debug, warn};

/// Reply when a domain query finds nothing above the threshold.
pub const NO_DATA_REPLY: &str = "I don't have information about that in our system. Our menu and order data might not include what you're looking for, or it could be temporarily unavailable. Please ask our staff directly for more details!";

/// What to do with a query after retrieval.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Domain query without usable context: answer with `NO_DATA_REPLY`.
    NoData,

    /// Off-domain query without usable context: open conversation.
    Fallback,

    /// Ground the answer in these results, best first, all above threshold.
    Grounded(Vec<QueryResult>),
}

/// Retrieves from the published generation and applies the threshold.
#[derive(Debug, Clone)]
pub struct RetrievalGate {
    handle: IndexHandle,
    provider: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    threshold: f32,
}

impl RetrievalGate {
    pub fn new(
        handle: IndexHandle,
        provider: Arc<dyn EmbeddingProvider>,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            handle,
            provider,
            top_k: settings.top_k.max(1),
            threshold: settings.similarity_threshold,
        }
    }

    /// Top-k results from the generation published when the call starts.
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<QueryResult>> {
        let generation = self.handle.current();
        if generation.is_empty() {
            debug!(generation = generation.id, "Index is empty");
            return Ok(vec![]);
        }

        let embedding = self
            .provider
            .embed(query)
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to embed query: {}", e)))?;

        generation.search(&embedding, self.top_k)
    }

    /// Decide between grounded answer, open fallback and the no-data reply.
    pub async fn decide(&self, query: &str, is_domain_query: bool) -> GateDecision {
        let results = match self.retrieve(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "Retrieval failed, treating as no context");
                vec![]
            }
        };

        let passing: Vec<QueryResult> = results
            .into_iter()
            .filter(|r| r.score >= self.threshold)
            .collect();

        debug!(
            passing = passing.len(),
            top_score = passing.first().map(|r| r.score).unwrap_or(0.0),
            threshold = self.threshold,
            "Retrieval gate"
        );

        match (passing.is_empty(), is_domain_query) {
            (true, true) => GateDecision::NoData,
            (true, false) => GateDecision::Fallback,
            (false, _) => GateDecision::Grounded(passing),
        }
    }
}
