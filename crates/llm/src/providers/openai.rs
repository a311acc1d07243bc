//! OpenAI-compatible chat completions provider.
//!
//! Serves both Groq and OpenAI: the wire format is the same, only the base
//! URL and the key differ. The prompt is sent as one user message.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use askdocs_core::{AppError, AppResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

/// Chat completions client for OpenAI-compatible endpoints.
pub struct OpenAiCompatClient {
    /// Provider label used in logs and errors ("groq", "openai")
    provider: String,

    /// Full URL of the chat completions endpoint
    endpoint: String,

    /// HTTP client with auth headers installed
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl OpenAiCompatClient {
    /// Build a client for `base_url` (e.g. `https://api.groq.com/openai/v1`).
    pub fn new(
        provider: impl Into<String>,
        base_url: &str,
        api_key: &str,
    ) -> AppResult<Self> {
        let provider = provider.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Config(format!("missing {} API key", provider)));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| AppError::Config(format!("invalid {} API key", provider)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                AppError::Config(format!("failed to build {} HTTP client: {}", provider, e))
            })?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            provider,
            client,
        })
    }

    fn build_body<'a>(&self, request: &'a LlmRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn convert_response(&self, request: &LlmRequest, parsed: ChatResponse) -> AppResult<LlmResponse> {
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::Generation(format!("{} returned no completion choices", self.provider))
            })?;

        let usage = parsed
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatClient {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    #[tracing::instrument(skip(self, request), fields(provider = %self.provider, model = %request.model))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending chat completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| {
                AppError::Generation(format!("failed to call {} chat completions: {}", self.provider, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::Generation(format!(
                "{} returned {}: {}",
                self.provider, status, text
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            AppError::Generation(format!("failed to parse {} response: {}", self.provider, e))
        })?;

        let completion = self.convert_response(request, parsed)?;

        tracing::info!(
            "Received completion ({} completion tokens)",
            completion.usage.completion_tokens
        );

        Ok(completion)
    }
}
