//! Knowledge pipeline type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Free-form metadata attached to documents, chunks and index entries.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Raw text of one loaded unit (a whole text file or one PDF page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Extracted text
    pub text: String,

    /// Source metadata (file path, page number, ...)
    pub metadata: Metadata,
}

impl Document {
    /// Create a document from text and metadata.
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A bounded window of a document's text, the unit of embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub text: String,

    /// Parent metadata plus `start_index`, `chunk_index` and `content_hash`
    pub metadata: Metadata,

    /// Offset of the first char within the parent document
    pub offset: usize,

    /// Position of the chunk across the whole build (insertion order)
    pub position: usize,
}

/// A persisted chunk together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique entry identifier
    pub id: String,

    /// Insertion order, used to break similarity ties
    pub position: usize,

    /// Chunk text
    pub text: String,

    /// Chunk metadata
    pub metadata: Metadata,

    /// Embedding vector
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Chunk text
    pub text: String,

    /// Chunk metadata
    pub metadata: Metadata,

    /// Cosine similarity to the query
    pub score: f32,

    /// 1-based rank (1 = most similar)
    pub rank: usize,
}

impl SearchHit {
    /// Source file path recorded at load time, if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }

    /// Page number for paginated sources.
    pub fn page(&self) -> Option<u64> {
        self.metadata.get("page").and_then(|v| v.as_u64())
    }
}

/// Ranked hits for one query, most similar first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<SearchHit>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Hit texts in rank order.
    pub fn texts(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.text.as_str()).collect()
    }
}

/// Outcome of building or loading the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// True when an existing index was loaded instead of built
    pub loaded_existing: bool,

    /// Documents read from the source directory (0 when loaded)
    pub documents_count: usize,

    /// Entries in the index
    pub chunks_count: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for a persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Directory holding the index
    pub persist_dir: PathBuf,

    /// Number of stored entries
    pub entries_count: usize,

    /// Number of distinct source files
    pub sources_count: usize,

    /// Embedding provider used at build time
    pub provider: String,

    /// Embedding model used at build time
    pub model: String,

    /// Embedding dimensions
    pub dimensions: usize,

    /// Chunking parameters used at build time
    pub chunk_size: usize,
    pub chunk_overlap: usize,

    /// Database size in bytes
    pub db_size_bytes: u64,

    /// When the index was built
    pub built_at: DateTime<Utc>,
}
