//! AskDocs Core Library
//!
//! Foundational utilities shared by every AskDocs crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, EmbeddingSettings, GenerationSettings, NoResultsPolicy};
pub use error::{AppError, AppResult};
