//! Query pipeline: retrieve, compose, generate, format.
//!
//! `QueryPipeline::answer` is the single entry point used by every caller.
//! It never fails: every error is turned into a `QueryResponse` carrying a
//! user-facing message and a status.

use crate::rag::format::format_answer;
use crate::rag::types::{ChunkPreview, QueryResponse};
use crate::retriever::Retriever;
use crate::types::RetrievalResult;
use askdocs_core::{AppConfig, AppResult, NoResultsPolicy};
use askdocs_llm::{LlmClient, LlmRequest};
use askdocs_prompt::PromptComposer;
use std::sync::Arc;

/// Per-query settings, fixed for the lifetime of a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Generation model identifier
    pub model: String,

    /// Chunks retrieved per query
    pub top_k: usize,

    /// Chars kept in each chunk preview
    pub preview_chars: usize,

    /// What to do when retrieval finds nothing
    pub no_results_policy: NoResultsPolicy,

    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.generation.model.clone(),
            top_k: config.top_k,
            preview_chars: config.preview_chars,
            no_results_policy: config.no_results_policy,
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
        }
    }
}

/// Shared, stateless question answering over a loaded index.
#[derive(Clone)]
pub struct QueryPipeline {
    retriever: Arc<Retriever>,
    llm: Arc<dyn LlmClient>,
    composer: Arc<PromptComposer>,
    options: PipelineOptions,
}

impl QueryPipeline {
    pub fn new(
        retriever: Arc<Retriever>,
        llm: Arc<dyn LlmClient>,
        composer: Arc<PromptComposer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            retriever,
            llm,
            composer,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `query` using the configured top-k.
    pub async fn answer(&self, query: &str) -> QueryResponse {
        self.answer_with_k(query, self.options.top_k).await
    }

    /// Answer `query` retrieving `k` chunks.
    pub async fn answer_with_k(&self, query: &str, k: usize) -> QueryResponse {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Empty query, skipping retrieval");
            return QueryResponse::empty_query();
        }

        tracing::info!("Answering query ({} chars, top-{})", query.chars().count(), k);

        let retrieval = match self.retriever.retrieve(query, k).await {
            Ok(retrieval) => retrieval,
            Err(e) => {
                tracing::error!("Retrieval failed: {}", e);
                return QueryResponse::retrieval_failed(query, &e.to_string());
            }
        };

        let previews = self.previews(&retrieval);

        if retrieval.is_empty() {
            match self.options.no_results_policy {
                NoResultsPolicy::NoInformation => {
                    tracing::info!("No chunks retrieved, skipping generation");
                    return QueryResponse::no_results(query);
                }
                NoResultsPolicy::GeneralKnowledge => {
                    tracing::info!("No chunks retrieved, answering from general knowledge");
                }
            }
        }

        match self.generate(query, &retrieval).await {
            Ok(raw) => {
                let answer = format_answer(&raw);
                tracing::debug!("Formatted answer: {} chars", answer.chars().count());
                QueryResponse::answered(query, answer, previews)
            }
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                QueryResponse::generation_failed(query, &e.to_string(), previews)
            }
        }
    }

    fn previews(&self, retrieval: &RetrievalResult) -> Vec<ChunkPreview> {
        retrieval
            .hits
            .iter()
            .map(|hit| ChunkPreview::from_hit(hit, self.options.preview_chars))
            .collect()
    }

    /// Compose the prompt and make the single completion call.
    async fn generate(&self, query: &str, retrieval: &RetrievalResult) -> AppResult<String> {
        let passages = retrieval.texts();
        let prompt = self.composer.compose(query, passages.as_slice())?;

        let mut request = LlmRequest::new(prompt.text, &self.options.model);
        if let Some(temperature) = self.options.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.options.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.llm.complete(&request).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use crate::rag::types::QueryStatus;
    use crate::store::VectorSearch;
    use crate::types::SearchHit;
    use askdocs_core::AppError;
    use askdocs_llm::LlmResponse;
    use askdocs_prompt::default_definition;

    struct EchoLlm;

    #[async_trait::async_trait]
    impl LlmClient for EchoLlm {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            Ok(LlmResponse {
                content: format!("<p>model={}</p>\n- point", request.model),
                model: request.model.clone(),
                usage: Default::default(),
            })
        }
    }

    struct DownLlm;

    #[async_trait::async_trait]
    impl LlmClient for DownLlm {
        fn provider_name(&self) -> &str {
            "down"
        }

        async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
            Err(AppError::Generation("groq returned 503 Service Unavailable".to_string()))
        }
    }

    struct OneHit;

    impl VectorSearch for OneHit {
        fn search(&self, _query: &[f32], _k: usize) -> AppResult<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                text: "x".repeat(30),
                metadata: Default::default(),
                score: 0.5,
                rank: 1,
            }])
        }

        fn len(&self) -> usize {
            1
        }

        fn dimensions(&self) -> usize {
            32
        }
    }

    fn pipeline(llm: Arc<dyn LlmClient>) -> QueryPipeline {
        let retriever = Retriever::new(Arc::new(MockProvider::new(32)), Arc::new(OneHit));
        let composer = PromptComposer::new(default_definition(), 1000).unwrap();
        QueryPipeline::new(
            Arc::new(retriever),
            llm,
            Arc::new(composer),
            PipelineOptions {
                model: "test-model".to_string(),
                top_k: 5,
                preview_chars: 10,
                no_results_policy: NoResultsPolicy::NoInformation,
                temperature: Some(0.2),
                max_tokens: None,
            },
        )
    }

    #[tokio::test]
    async fn test_answer_is_formatted() {
        let response = pipeline(Arc::new(EchoLlm)).answer("  what?  ").await;

        assert_eq!(response.status, QueryStatus::Answered);
        assert_eq!(response.query, "what?");
        assert_eq!(response.answer, "model=test-model\n• point");
        assert_eq!(response.previews.len(), 1);
        assert_eq!(response.previews[0].text, format!("{}...", "x".repeat(10)));
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_cause() {
        let response = pipeline(Arc::new(DownLlm)).answer("what?").await;

        assert_eq!(response.status, QueryStatus::GenerationFailed);
        assert!(response.answer.starts_with("Error generating answer: "));
        assert!(response.answer.contains("503 Service Unavailable"));
        assert_eq!(response.previews.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_query() {
        let response = pipeline(Arc::new(DownLlm)).answer(" \t ").await;
        assert_eq!(response.status, QueryStatus::EmptyQuery);
        assert_eq!(response.answer, "Please enter a question.");
    }
}
