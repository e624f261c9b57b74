//! Text-generation integration for Tableside.
//!
//! A provider-agnostic `LlmClient` trait plus the Ollama implementation used
//! in production. The generation service is treated as untrusted: callers get
//! raw text back and are expected to sanitize it.
//!
//! # Example
//! ```no_run
//! use tableside_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Suggest a mild curry", "tinyllama");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OllamaClient;
