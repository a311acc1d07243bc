//! Question answering over the vector index.
//!
//! Retrieves relevant chunks, composes the prompt, calls the language model
//! once and formats its answer for display.

pub mod format;
pub mod pipeline;
pub mod types;

pub use format::{classify, format_answer, render, sanitize_markup, AnswerLine};
pub use pipeline::{PipelineOptions, QueryPipeline};
pub use types::{ChunkPreview, QueryResponse, QueryStatus};
