//! Prompt types for AskDocs.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
///
/// The template is rendered with Handlebars and may reference
/// `{{instructions}}`, `{{context}}` and `{{query}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Fixed instruction text placed ahead of the reference information
    #[serde(default)]
    pub instructions: String,

    /// Template string with Handlebars syntax
    pub template: String,
}

/// A composed prompt ready for the answer generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// The full prompt text, sent as one user message
    pub text: String,

    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Number of context passages serialized into the prompt
    #[serde(rename = "passagesIncluded")]
    pub passages_included: usize,
}
