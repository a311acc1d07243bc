//! Fixed-size, overlapping text chunking.
//!
//! Windows are measured in chars so a chunk never ends inside a multibyte
//! character.

use crate::types::{Chunk, Document};
use askdocs_core::{AppError, AppResult};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Splits documents into windows of at most `size` chars, consecutive
/// windows sharing `overlap` chars.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSplitter {
    size: usize,
    overlap: usize,
}

impl ChunkSplitter {
    /// Create a splitter.
    ///
    /// # Errors
    /// Returns `AppError::Config` unless `0 <= overlap < size`.
    pub fn new(size: usize, overlap: usize) -> AppResult<Self> {
        if size == 0 {
            return Err(AppError::Config("chunk size must be positive".to_string()));
        }
        if overlap >= size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split every document, numbering chunks in the order produced.
    pub fn split_documents<I>(&self, documents: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut chunks = Vec::new();
        let mut documents_count = 0usize;

        for document in documents {
            documents_count += 1;
            let start_position = chunks.len();
            chunks.extend(self.split_document(&document, start_position));
        }

        tracing::debug!(
            "Split {} documents into {} chunks (size: {}, overlap: {})",
            documents_count,
            chunks.len(),
            self.size,
            self.overlap
        );

        chunks
    }

    /// Split one document. `first_position` is the corpus-wide position
    /// given to its first chunk.
    pub fn split_document(&self, document: &Document, first_position: usize) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();
        let step = self.size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.size).min(chars.len());
            let text: String = chars[start..end].iter().collect();

            let chunk_index = chunks.len();
            let mut metadata = document.metadata.clone();
            metadata.insert("start_index".to_string(), Value::from(start));
            metadata.insert("chunk_index".to_string(), Value::from(chunk_index));
            metadata.insert(
                "content_hash".to_string(),
                Value::String(content_hash(&text)),
            );

            chunks.push(Chunk {
                text,
                metadata,
                offset: start,
                position: first_position + chunk_index,
            });

            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// SHA-256 of the chunk text, hex encoded.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
