//! LLM client abstraction and request/response types.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tableside_core::AppResult;

/// One generation call: prompt text plus sampling limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// User-facing prompt body
    pub prompt: String,

    /// Model identifier (e.g., "tinyllama", "llama3.2")
    pub model: String,

    /// Cap on generated tokens (`num_predict` for Ollama)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature; low values keep answers close to the context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// System prompt (persona instruction)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Upper bound on how long the call may take
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            system: None,
            timeout: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What the generation service sent back. The text is untrusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Raw generated text
    pub content: String,

    /// Model that actually answered
    pub model: String,

    pub usage: LlmUsage,

    /// `false` when the backend stopped before finishing
    #[serde(default = "default_true")]
    pub done: bool,
}

fn default_true() -> bool {
    true
}

/// Token counts reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for text-generation providers.
///
/// Implementations must report failures as `AppError::Generation`, or
/// `AppError::ResourceExhausted` when the backend ran out of memory.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short backend name for logs.
    fn provider_name(&self) -> &str;

    /// Run one non-streaming generation.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
