//! Prompt definitions and their rendered form.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One prompt, built in or read from `.tableside/prompts/<id>.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Dotted id such as `menu.grounded`
    pub id: String,

    pub title: String,

    /// Schema version, `major.minor`
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    #[serde(default)]
    pub behavior: PromptBehavior,

    /// Handlebars template sent as the system message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Handlebars template for the prompt body
    pub template: String,
}

/// How answers from this prompt should read, plus sampling overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptBehavior {
    #[serde(default)]
    pub tone: String,

    #[serde(default)]
    pub style: String,

    /// Replaces the configured generation temperature for this prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Replaces the configured generation token limit for this prompt
    #[serde(rename = "maxTokens", default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A rendered prompt, ready to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    pub system: Option<String>,

    pub user: String,

    pub metadata: BuiltPromptMetadata,
}

/// Where a rendered prompt came from, for debug logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                resolved_variables,
            },
        }
    }
}
