//! LLM provider factory.
//!
//! Creates generation clients from the `llm` section of the configuration.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use std::sync::Arc;
use std::time::Duration;
use tableside_core::config::LlmSettings;

/// Create an LLM client for the configured provider.
///
/// # Errors
/// Returns an error message if the provider is unknown.
pub fn create_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>, String> {
    match settings.provider.to_lowercase().as_str() {
        "ollama" => {
            let client = OllamaClient::with_base_url(&settings.endpoint)
                .with_default_timeout(Duration::from_secs(settings.timeout_secs));
            Ok(Arc::new(client))
        }
        _ => Err(format!("Unknown provider: {}", settings.provider)),
    }
}
