//! Prompt composition for AskDocs.
//!
//! Turns a question and its retrieved passages into the single prompt
//! string sent to the answer generator:
//! - Built-in or YAML-defined prompt definitions
//! - Handlebars template rendering
//! - Rank-ordered, length-bounded context serialization

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::{
    default_definition, serialize_context, truncate_chars, PromptComposer, DEFAULT_CONTEXT_CHARS,
};
pub use loader::{load_prompt_file, validate_prompt};
pub use types::{BuiltPrompt, PromptDefinition};
