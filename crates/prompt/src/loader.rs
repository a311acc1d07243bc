//! Loading of custom prompt definitions from YAML files.

use crate::types::PromptDefinition;
use askdocs_core::{AppError, AppResult};
use std::path::Path;

/// Load and validate a prompt definition from `path`.
///
/// # Example
/// ```no_run
/// use askdocs_prompt::load_prompt_file;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt_file(Path::new("prompts/answer.yml"))?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt_file(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!("Prompt file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e)))?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Validate a prompt definition.
pub fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.trim().is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.trim().is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt("Prompt template cannot be empty".to_string()));
    }

    let version_ok = def
        .api_version
        .split_once('.')
        .map(|(major, minor)| is_number(major) && is_number(minor))
        .unwrap_or(false);
    if !version_ok {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: '{}'. Expected format: 'x.y'",
            def.api_version
        )));
    }

    // Without the query the model has nothing to answer.
    if !def.template.contains("{{query}}") {
        return Err(AppError::Prompt(format!(
            "Prompt template '{}' must reference {{{{query}}}}",
            def.id
        )));
    }

    Ok(())
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const VALID: &str = r#"
id: custom.answer
title: "Custom Answer"
apiVersion: "1.0"
instructions: "Answer in one sentence."
template: "{{instructions}}\nContext: {{context}}\nQ: {{query}}"
"#;

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(temp_dir.path(), "answer.yml", VALID);

        let prompt = load_prompt_file(&path).unwrap();
        assert_eq!(prompt.id, "custom.answer");
        assert_eq!(prompt.title, "Custom Answer");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt_file(&temp_dir.path().join("missing.yml"));
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(temp_dir.path(), "bad.yml", "invalid: yaml: content:");
        assert!(load_prompt_file(&path).is_err());
    }

    #[test]
    fn test_invalid_api_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(
            temp_dir.path(),
            "v.yml",
            &VALID.replace("\"1.0\"", "\"v1\""),
        );
        let err = load_prompt_file(&path).unwrap_err();
        assert!(err.to_string().contains("apiVersion"));
    }

    #[test]
    fn test_template_without_query_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(
            temp_dir.path(),
            "noquery.yml",
            "id: a\ntitle: b\napiVersion: \"1.0\"\ntemplate: \"{{context}}\"\n",
        );
        let err = load_prompt_file(&path).unwrap_err();
        assert!(err.to_string().contains("{{query}}"));
    }
}
