//! Cross-module scenarios and the test doubles they share.

mod end_to_end;
mod persistence;

use crate::embeddings::{EmbeddingProvider, MockProvider};
use crate::rag::{PipelineOptions, QueryPipeline};
use crate::retriever::Retriever;
use crate::store::VectorSearch;
use askdocs_core::{AppConfig, AppError, AppResult};
use askdocs_llm::{LlmClient, LlmRequest, LlmResponse};
use askdocs_prompt::PromptComposer;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub(crate) const DIMENSIONS: usize = 384;

/// Completion double that records every prompt and replies with fixed text.
pub(crate) struct RecordingLlm {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingLlm {
    pub(crate) fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for RecordingLlm {
    fn provider_name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        Ok(LlmResponse {
            content: self.reply.clone(),
            model: request.model.clone(),
            usage: Default::default(),
        })
    }
}

/// Mock embeddings that count how many texts were embedded.
#[derive(Debug)]
pub(crate) struct CountingEmbedder {
    inner: MockProvider,
    texts: AtomicUsize,
}

impl CountingEmbedder {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MockProvider::new(DIMENSIONS),
            texts: AtomicUsize::new(0),
        })
    }

    pub(crate) fn embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

/// Embeddings double standing in for an unreachable service.
#[derive(Debug)]
pub(crate) struct UnreachableEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding(
            "error sending request: connection refused".to_string(),
        ))
    }
}

/// A workspace whose `data/` holds `files`, configured for mock embeddings.
pub(crate) fn workspace(files: &[(&str, &str)]) -> (TempDir, AppConfig) {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    for (name, content) in files {
        fs::write(data_dir.join(name), content).unwrap();
    }

    let mut config = AppConfig::with_workspace(temp.path());
    config.embedding.provider = "mock".to_string();
    config.embedding.model = "trigram-v1".to_string();
    config.embedding.dimensions = DIMENSIONS;
    (temp, config)
}

pub(crate) fn pipeline(
    config: &AppConfig,
    index: Arc<dyn VectorSearch>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
) -> QueryPipeline {
    let retriever = Retriever::new(embedder, index);
    let composer = PromptComposer::from_file(None, config.context_chars).unwrap();
    QueryPipeline::new(
        Arc::new(retriever),
        llm,
        Arc::new(composer),
        PipelineOptions::from_config(config),
    )
}
