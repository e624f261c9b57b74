//! The assistant façade: classify, gate, generate, sanitize.

use crate::classifier::{classify, Classification};
use crate::gate::{GateDecision, RetrievalGate, NO_DATA_REPLY};
use crate::generator::ResponseGenerator;
use crate::sanitizer::Sanitizer;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tableside_core::{AppConfig, AppError, AppResult};
use tableside_knowledge::{EmbeddingProvider, IndexHandle};
use tableside_llm::LlmClient;
use tableside_prompt::PromptSet;
use tracing::{error, info, instrument, warn};

/// Reply when the generation backend ran out of memory or stopped early.
pub const RESOURCE_EXHAUSTED_REPLY: &str = "[Ollama Error] The model stopped or ran out of resources. Try restarting Ollama or freeing memory.";

/// Reply for any other generation failure.
pub const GENERATION_FAILED_REPLY: &str =
    "Sorry, I couldn't put an answer together just now. Please try again in a moment or ask our staff!";

/// A finished answer, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub query: String,
    /// ISO-8601 UTC with a `Z` suffix
    pub timestamp: String,
}

impl Answer {
    fn new(answer: impl Into<String>, query: &str) -> Self {
        Self {
            answer: answer.into(),
            query: query.to_string(),
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
        }
    }
}

/// Answers guest questions against the published index generation.
pub struct Assistant {
    gate: RetrievalGate,
    generator: ResponseGenerator,
    sanitizer: Sanitizer,
}

impl Assistant {
    pub fn new(gate: RetrievalGate, generator: ResponseGenerator, sanitizer: Sanitizer) -> Self {
        Self {
            gate,
            generator,
            sanitizer,
        }
    }

    /// Wire up an assistant from configuration, loading prompt overrides
    /// from the workspace.
    pub fn from_config(
        config: &AppConfig,
        handle: IndexHandle,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
    ) -> AppResult<Self> {
        let prompts = PromptSet::load(&config.workspace)?;

        Ok(Self::new(
            RetrievalGate::new(handle, embedder, &config.retrieval),
            ResponseGenerator::new(llm, prompts, &config.llm, &config.retrieval),
            Sanitizer::new(&config.answer),
        ))
    }

    /// Answer one query. Never fails: every problem becomes reply text.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn answer(&self, query: &str) -> Answer {
        let (text, is_domain_query) = match classify(query) {
            Classification::Canned(reply) => {
                info!("Answered without retrieval");
                return Answer::new(reply, query);
            }
            Classification::Query {
                text,
                is_domain_query,
            } => (text, is_domain_query),
        };

        let candidate = match self.gate.decide(&text, is_domain_query).await {
            GateDecision::NoData => {
                info!("No matching data for domain query");
                return Answer::new(NO_DATA_REPLY, query);
            }
            GateDecision::Fallback => self.generator.open(&text).await,
            GateDecision::Grounded(context) => self.generator.grounded(&text, &context).await,
        };

        match candidate {
            Ok(candidate) => {
                let answer = self.sanitizer.sanitize(&candidate);
                info!(
                    grounded = candidate.grounded,
                    chunks = candidate.chunks_used,
                    chars = answer.chars().count(),
                    "Answered query"
                );
                Answer::new(answer, query)
            }
            Err(e) => {
                if e.is_generation() {
                    warn!(error = %e, "Generation failed");
                } else {
                    error!(error = %e, "Could not prepare generation");
                }
                Answer::new(failure_reply(&e), query)
            }
        }
    }
}

fn failure_reply(error: &AppError) -> &'static str {
    match error {
        AppError::ResourceExhausted(_) => RESOURCE_EXHAUSTED_REPLY,
        _ => GENERATION_FAILED_REPLY,
    }
}
