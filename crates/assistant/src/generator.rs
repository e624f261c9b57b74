//! Prompt assembly and generation calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tableside_core::config::{LlmSettings, RetrievalSettings};
use tableside_core::AppResult;
use tableside_knowledge::QueryResult;
use tableside_llm::{LlmClient, LlmRequest};
use tableside_prompt::{build_prompt, BuiltPrompt, PromptDefinition, PromptSet};
use tracing::{debug, instrument, warn};

/// Raw model output for one query. Nothing about its content is trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAnswer {
    /// Model text, trimmed
    pub text: String,

    /// The query the answer responds to
    pub query: String,

    /// Whether retrieved context was supplied
    pub grounded: bool,

    /// Number of retrieved chunks folded into the answer
    pub chunks_used: usize,
}

/// Builds prompts and calls the generation service.
pub struct ResponseGenerator {
    client: Arc<dyn LlmClient>,
    prompts: PromptSet,
    llm: LlmSettings,
    context_chars: usize,
    refine: bool,
}

impl ResponseGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: PromptSet,
        llm: &LlmSettings,
        retrieval: &RetrievalSettings,
    ) -> Self {
        Self {
            client,
            prompts,
            llm: llm.clone(),
            context_chars: retrieval.context_chars,
            refine: retrieval.refine,
        }
    }

    /// Answer from the top retrieved chunk, optionally refined with the rest.
    #[instrument(skip(self, query, context), fields(chunks = context.len()))]
    pub async fn grounded(&self, query: &str, context: &[QueryResult]) -> AppResult<CandidateAnswer> {
        let Some((top, rest)) = context.split_first() else {
            return self.open(query).await;
        };

        let mut vars = self.base_vars(query);
        vars.insert("context".to_string(), bounded(&top.chunk.text, self.context_chars));
        let prompt = build_prompt(&self.prompts.grounded, vars)?;
        let mut text = self.complete(&self.prompts.grounded, prompt).await?;
        let mut chunks_used = 1;

        if self.refine && !rest.is_empty() {
            match self.refine_with(query, &text, rest).await {
                Ok(refined) if !refined.is_empty() => {
                    text = refined;
                    chunks_used += rest.len();
                }
                Ok(_) => debug!("Refinement returned nothing, keeping first answer"),
                Err(e) => warn!(error = %e, "Refinement failed, keeping first answer"),
            }
        }

        Ok(CandidateAnswer {
            text,
            query: query.to_string(),
            grounded: true,
            chunks_used,
        })
    }

    /// Open conversation with no retrieved context.
    #[instrument(skip(self, query))]
    pub async fn open(&self, query: &str) -> AppResult<CandidateAnswer> {
        let prompt = build_prompt(&self.prompts.fallback, self.base_vars(query))?;
        let text = self.complete(&self.prompts.fallback, prompt).await?;

        Ok(CandidateAnswer {
            text,
            query: query.to_string(),
            grounded: false,
            chunks_used: 0,
        })
    }

    async fn refine_with(
        &self,
        query: &str,
        existing: &str,
        extra: &[QueryResult],
    ) -> AppResult<String> {
        let context = extra
            .iter()
            .map(|r| bounded(&r.chunk.text, self.context_chars))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = self.base_vars(query);
        vars.insert("existing_answer".to_string(), existing.to_string());
        vars.insert("context".to_string(), context);
        let prompt = build_prompt(&self.prompts.refine, vars)?;
        self.complete(&self.prompts.refine, prompt).await
    }

    fn base_vars(&self, query: &str) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("persona".to_string(), self.prompts.persona.clone());
        vars.insert("query".to_string(), query.to_string());
        vars
    }

    async fn complete(&self, definition: &PromptDefinition, prompt: BuiltPrompt) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt.user, &self.llm.model)
            .with_temperature(definition.behavior.temperature.unwrap_or(self.llm.temperature))
            .with_max_tokens(definition.behavior.max_tokens.unwrap_or(self.llm.max_tokens))
            .with_timeout(Duration::from_secs(self.llm.timeout_secs));
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;
        debug!(
            prompt_id = %prompt.metadata.source_prompt_id,
            completion_tokens = response.usage.completion_tokens,
            "Generation complete"
        );
        Ok(response.content.trim().to_string())
    }
}

/// The first `limit` characters of `text`.
fn bounded(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
