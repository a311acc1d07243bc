//! Query pipeline response types.

use crate::types::SearchHit;
use serde::{Deserialize, Serialize};

/// Shown when the query is empty or whitespace-only.
pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a question.";

/// Shown when retrieval found nothing and generation is skipped.
pub const NO_RESULTS_MESSAGE: &str = "I couldn't find any relevant information in the documents.";

/// How a query was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Generated and formatted an answer
    Answered,
    /// Query was blank; nothing was called
    EmptyQuery,
    /// Retrieval returned no chunks
    NoResults,
    /// Embedding or index lookup failed
    RetrievalFailed,
    /// The completion service failed
    GenerationFailed,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::EmptyQuery => "empty_query",
            Self::NoResults => "no_results",
            Self::RetrievalFailed => "retrieval_failed",
            Self::GenerationFailed => "generation_failed",
        }
    }
}

/// Truncated view of a retrieved chunk, shown alongside the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPreview {
    /// Leading text of the chunk, with `...` appended when cut
    pub text: String,

    /// Source file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Page number for paginated sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,

    /// Similarity to the query
    pub score: f32,

    /// 1-based rank
    pub rank: usize,
}

impl ChunkPreview {
    /// Build a preview of `hit` holding at most `max_chars` chars of text.
    pub fn from_hit(hit: &SearchHit, max_chars: usize) -> Self {
        let truncated = askdocs_prompt::truncate_chars(&hit.text, max_chars);
        let text = if truncated.len() < hit.text.len() {
            format!("{}...", truncated)
        } else {
            truncated.to_string()
        };

        Self {
            text,
            source: hit.source().map(str::to_string),
            page: hit.page(),
            score: hit.score,
            rank: hit.rank,
        }
    }
}

/// Everything the caller needs to display the outcome of one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Query as received, trimmed
    pub query: String,

    pub status: QueryStatus,

    /// Formatted answer or user-facing message
    pub answer: String,

    /// Retrieved chunks, best first
    pub previews: Vec<ChunkPreview>,
}

impl QueryResponse {
    /// Response for a blank query.
    pub fn empty_query() -> Self {
        Self {
            query: String::new(),
            status: QueryStatus::EmptyQuery,
            answer: EMPTY_QUERY_MESSAGE.to_string(),
            previews: Vec::new(),
        }
    }

    /// Response when nothing relevant was retrieved.
    pub fn no_results(query: &str) -> Self {
        Self {
            query: query.to_string(),
            status: QueryStatus::NoResults,
            answer: NO_RESULTS_MESSAGE.to_string(),
            previews: Vec::new(),
        }
    }

    /// Response when the question could not be embedded or searched.
    pub fn retrieval_failed(query: &str, cause: &str) -> Self {
        Self {
            query: query.to_string(),
            status: QueryStatus::RetrievalFailed,
            answer: format!("Sorry, I could not process your question: {}", cause),
            previews: Vec::new(),
        }
    }

    /// Response when the completion service failed.
    pub fn generation_failed(query: &str, cause: &str, previews: Vec<ChunkPreview>) -> Self {
        Self {
            query: query.to_string(),
            status: QueryStatus::GenerationFailed,
            answer: format!("Error generating answer: {}", cause),
            previews,
        }
    }

    pub fn answered(query: &str, answer: String, previews: Vec<ChunkPreview>) -> Self {
        Self {
            query: query.to_string(),
            status: QueryStatus::Answered,
            answer,
            previews,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == QueryStatus::Answered
    }
}
