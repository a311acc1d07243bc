//! Answer generation clients for AskDocs.
//!
//! A provider-agnostic completion interface with two wire implementations:
//! the OpenAI-compatible chat completions API (Groq, OpenAI) and Ollama's
//! generate API.
//!
//! # Example
//! ```no_run
//! use askdocs_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("groq", None, Some("gsk-..."))?;
//! let request = LlmRequest::new("What color is the sky?", "openai/gpt-oss-120b");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiCompatClient};
pub use types::ProviderType;
