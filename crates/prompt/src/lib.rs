//! Prompt system for Tableside.
//!
//! - YAML prompt definitions, built in and overridable per workspace
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    builtin_prompt, load_prompt, PromptSet, FALLBACK_PROMPT, GROUNDED_PROMPT, PERSONA_PROMPT,
    REFINE_PROMPT,
};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition};
