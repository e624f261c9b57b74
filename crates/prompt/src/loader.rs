//! Prompt loader for YAML prompt definitions.
//!
//! Every prompt the assistant uses ships built in. A workspace may override
//! any of them with `.tableside/prompts/<id>.yml`.

use crate::builder::render_template;
use crate::types::PromptDefinition;
use std::collections::HashMap;
use std::path::Path;
use tableside_core::config::STATE_DIR;
use tableside_core::{AppError, AppResult};

/// Persona instruction shared by every generation prompt.
pub const PERSONA_PROMPT: &str = "menu.persona";
/// Answer grounded in retrieved context.
pub const GROUNDED_PROMPT: &str = "menu.grounded";
/// Open conversation when nothing relevant was retrieved.
pub const FALLBACK_PROMPT: &str = "menu.fallback";
/// Optional second pass folding in additional context.
pub const REFINE_PROMPT: &str = "menu.refine";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (PERSONA_PROMPT, include_str!("../prompts/menu.persona.yml")),
    (GROUNDED_PROMPT, include_str!("../prompts/menu.grounded.yml")),
    (FALLBACK_PROMPT, include_str!("../prompts/menu.fallback.yml")),
    (REFINE_PROMPT, include_str!("../prompts/menu.refine.yml")),
];

/// Load a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, source) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown built-in prompt: {}", prompt_id)))?;

    let definition: PromptDefinition = serde_yaml::from_str(source).map_err(|e| {
        AppError::Prompt(format!("Failed to parse built-in prompt {}: {}", prompt_id, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Load a prompt definition by ID, preferring a workspace override.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.tableside/`
/// * `prompt_id` - Prompt identifier (e.g., "menu.grounded")
///
/// # Example
/// ```no_run
/// use tableside_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "menu.grounded")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(STATE_DIR)
        .join("prompts")
        .join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() {
        return builtin_prompt(prompt_id);
    }

    tracing::debug!("Loading prompt override from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}', expected '{}'",
            prompt_file, definition.id, prompt_id
        )));
    }

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// The prompts used to answer one guest question.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// Rendered persona instruction
    pub persona: String,
    pub grounded: PromptDefinition,
    pub fallback: PromptDefinition,
    pub refine: PromptDefinition,
}

impl PromptSet {
    /// Load every prompt, applying workspace overrides.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let persona_def = load_prompt(workspace_path, PERSONA_PROMPT)?;
        let persona = render_template(&persona_def.template, &HashMap::new())?;

        Ok(Self {
            persona,
            grounded: load_prompt(workspace_path, GROUNDED_PROMPT)?,
            fallback: load_prompt(workspace_path, FALLBACK_PROMPT)?,
            refine: load_prompt(workspace_path, REFINE_PROMPT)?,
        })
    }

    /// The built-in prompts with no overrides.
    pub fn builtin() -> AppResult<Self> {
        let persona_def = builtin_prompt(PERSONA_PROMPT)?;
        let persona = render_template(&persona_def.template, &HashMap::new())?;

        Ok(Self {
            persona,
            grounded: builtin_prompt(GROUNDED_PROMPT)?,
            fallback: builtin_prompt(FALLBACK_PROMPT)?,
            refine: builtin_prompt(REFINE_PROMPT)?,
        })
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, content: &str) -> PathBuf {
        let prompts_dir = dir.join(".tableside/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        let file_path = prompts_dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_builtin_prompts_parse() {
        for (id, _) in BUILTIN_PROMPTS {
            let def = builtin_prompt(id).unwrap();
            assert_eq!(def.id, *id);
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_prompt("menu.nope").is_err());
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), GROUNDED_PROMPT).unwrap();
        assert!(prompt.template.contains("{{context}}"));
    }

    #[test]
    fn test_load_override() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            FALLBACK_PROMPT,
            "id: menu.fallback\ntitle: Short\napiVersion: \"1.0\"\ntemplate: \"Reply to {{query}}\"\n",
        );

        let prompt = load_prompt(temp_dir.path(), FALLBACK_PROMPT).unwrap();
        assert_eq!(prompt.title, "Short");
        assert_eq!(prompt.template, "Reply to {{query}}");
    }

    #[test]
    fn test_override_with_wrong_id() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            REFINE_PROMPT,
            "id: something.else\ntitle: X\napiVersion: \"1.0\"\ntemplate: x\n",
        );

        assert!(load_prompt(temp_dir.path(), REFINE_PROMPT).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), GROUNDED_PROMPT, "invalid: yaml: content:");

        assert!(load_prompt(temp_dir.path(), GROUNDED_PROMPT).is_err());
    }

    #[test]
    fn test_prompt_set_persona() {
        let set = PromptSet::builtin().unwrap();
        assert!(set.persona.contains("restaurant assistant"));
        assert!(set.persona.contains("file paths"));
        assert_eq!(set.refine.id, REFINE_PROMPT);
    }
}
