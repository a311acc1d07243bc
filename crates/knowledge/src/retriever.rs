//! Query-time retrieval: embed the question, search the index.

use crate::embeddings::{validate_embeddings, EmbeddingProvider};
use crate::store::VectorSearch;
use crate::types::RetrievalResult;
use askdocs_core::{AppError, AppResult};
use std::sync::Arc;

/// Embeds queries and looks up the closest stored chunks.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorSearch>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorSearch>) -> Self {
        Self { embedder, index }
    }

    /// Number of entries available for retrieval.
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// Return the `k` chunks most similar to `query`.
    ///
    /// # Errors
    /// Any embedding or index failure is returned as `AppError::Retrieval`
    /// with the cause in its message.
    pub async fn retrieve(&self, query: &str, k: usize) -> AppResult<RetrievalResult> {
        self.retrieve_inner(query, k)
            .await
            .map_err(AppError::into_retrieval)
    }

    async fn retrieve_inner(&self, query: &str, k: usize) -> AppResult<RetrievalResult> {
        let vector = self.embedder.embed(query).await?;
        validate_embeddings(
            self.embedder.provider_name(),
            std::slice::from_ref(&vector),
            1,
            self.embedder.dimensions(),
        )?;

        let hits = self.index.search(&vector, k)?;

        match hits.first() {
            Some(top) => tracing::info!(
                "Retrieved {} chunks (top score: {:.3})",
                hits.len(),
                top.score
            ),
            None => tracing::info!("No chunks retrieved"),
        }

        Ok(RetrievalResult { hits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use crate::types::SearchHit;

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn provider_name(&self) -> &str {
            "failing"
        }

        fn model_name(&self) -> &str {
            "none"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Err(AppError::Embedding("connection refused".to_string()))
        }
    }

    /// Index double returning fixed hits regardless of the query.
    struct FixedIndex {
        dimensions: usize,
        hits: Vec<SearchHit>,
    }

    impl VectorSearch for FixedIndex {
        fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
            if query.len() != self.dimensions {
                return Err(AppError::Index("dimension mismatch".to_string()));
            }
            Ok(self.hits.iter().take(k).cloned().collect())
        }

        fn len(&self) -> usize {
            self.hits.len()
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    fn hit(text: &str, rank: usize) -> SearchHit {
        SearchHit {
            text: text.to_string(),
            metadata: Default::default(),
            score: 1.0 / rank as f32,
            rank,
        }
    }

    #[tokio::test]
    async fn test_retrieve_delegates_to_index() {
        let index = FixedIndex {
            dimensions: 16,
            hits: vec![hit("a", 1), hit("b", 2), hit("c", 3)],
        };
        let retriever = Retriever::new(Arc::new(MockProvider::new(16)), Arc::new(index));

        let result = retriever.retrieve("anything", 2).await.unwrap();
        assert_eq!(result.texts(), vec!["a", "b"]);
        assert_eq!(retriever.index_len(), 3);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_retrieval_error() {
        let index = FixedIndex {
            dimensions: 4,
            hits: vec![hit("a", 1)],
        };
        let retriever = Retriever::new(Arc::new(FailingProvider), Arc::new(index));

        match retriever.retrieve("question", 1).await {
            Err(AppError::Retrieval(msg)) => assert!(msg.contains("connection refused")),
            other => panic!("expected retrieval error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_index_failure_is_retrieval_error() {
        let index = FixedIndex {
            dimensions: 8,
            hits: vec![hit("a", 1)],
        };
        let retriever = Retriever::new(Arc::new(MockProvider::new(16)), Arc::new(index));

        assert!(matches!(
            retriever.retrieve("question", 1).await,
            Err(AppError::Retrieval(_))
        ));
    }
}
