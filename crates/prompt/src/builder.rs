//! Prompt composition: instructions, reference passages and the question.

use crate::loader::{load_prompt_file, validate_prompt};
use crate::types::{BuiltPrompt, PromptDefinition};
use askdocs_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;

const TEMPLATE_NAME: &str = "prompt";

/// Default cap on the characters of one passage placed in the prompt.
pub const DEFAULT_CONTEXT_CHARS: usize = 1000;

/// Instruction text of the built-in prompt.
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are a helpful and knowledgeable AI assistant.
You have access to reference information. Use it only if it is relevant, and you may provide additional reasoning, explanations, examples, or step by step guidance.
Write in a friendly and engaging tone.
If the reference information does not fully answer the question, use your general knowledge to provide a helpful answer.
HTML is forbidden. Never use br or any other tag.
All output must be plain text only, with real newline characters.
Do not use formatting such as bold, italics, emojis, tables, or special characters.";

/// Template of the built-in prompt.
pub const DEFAULT_TEMPLATE: &str = "\
{{instructions}}

Reference Information:
{{context}}

Question: {{query}}

Answer:
If you use the reference information, you may mention the source chunk number.
";

/// The prompt definition used when no prompt file is configured.
pub fn default_definition() -> PromptDefinition {
    PromptDefinition {
        id: "askdocs.answer.default".to_string(),
        title: "Grounded answer".to_string(),
        api_version: "1.0".to_string(),
        instructions: DEFAULT_INSTRUCTIONS.to_string(),
        template: DEFAULT_TEMPLATE.to_string(),
    }
}

#[derive(Serialize)]
struct TemplateVars<'a> {
    instructions: &'a str,
    context: &'a str,
    query: &'a str,
}

/// Renders prompts from one definition.
///
/// The template is compiled once; `compose` can then be called from many
/// queries concurrently.
pub struct PromptComposer {
    definition: PromptDefinition,
    context_chars: usize,
    registry: Handlebars<'static>,
}

impl PromptComposer {
    /// Create a composer for `definition`, truncating each passage to
    /// `context_chars` characters.
    pub fn new(definition: PromptDefinition, context_chars: usize) -> AppResult<Self> {
        validate_prompt(&definition)?;

        let mut registry = Handlebars::new();
        // Plain text prompt; nothing must be HTML-escaped.
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, &definition.template)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self {
            definition,
            context_chars,
            registry,
        })
    }

    /// Create a composer from an optional prompt file, falling back to the
    /// built-in definition.
    pub fn from_file(path: Option<&Path>, context_chars: usize) -> AppResult<Self> {
        let definition = match path {
            Some(path) => load_prompt_file(path)?,
            None => default_definition(),
        };
        Self::new(definition, context_chars)
    }

    /// The definition this composer renders.
    pub fn definition(&self) -> &PromptDefinition {
        &self.definition
    }

    /// Compose the prompt for `query` from passages ordered most relevant
    /// first.
    pub fn compose<S: AsRef<str>>(&self, query: &str, passages: &[S]) -> AppResult<BuiltPrompt> {
        let context = serialize_context(passages, self.context_chars);
        let vars = TemplateVars {
            instructions: &self.definition.instructions,
            context: &context,
            query,
        };

        let text = self
            .registry
            .render(TEMPLATE_NAME, &vars)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        tracing::debug!(
            "Composed prompt {} with {} passages ({} chars)",
            self.definition.id,
            passages.len(),
            text.chars().count()
        );

        Ok(BuiltPrompt {
            text,
            source_prompt_id: self.definition.id.clone(),
            passages_included: passages.len(),
        })
    }
}

/// Serialize passages as a numbered list in rank order.
///
/// Each passage has its line breaks collapsed to single spaces and is then
/// cut to at most `max_chars` characters.
pub fn serialize_context<S: AsRef<str>>(passages: &[S], max_chars: usize) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            let flat = collapse_newlines(passage.as_ref());
            format!("{}. {}", i + 1, truncate_chars(&flat, max_chars))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Borrow at most `max_chars` characters from the start of `text`.
///
/// Always cuts on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn collapse_newlines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
