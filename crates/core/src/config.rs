//! Configuration management for AskDocs.
//!
//! Configuration is resolved in layers, later layers winning:
//! - Built-in defaults
//! - Config file (`.askdocs/config.yaml` or `ASKDOCS_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! API keys are never stored in the config file. The file only names the
//! environment variable that holds each key.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Embedding providers the knowledge crate can construct.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Completion providers the llm crate can construct.
pub const GENERATION_PROVIDERS: [&str; 3] = ["groq", "openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root (contains `.askdocs/`)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Folder scanned for source documents
    pub data_dir: PathBuf,

    /// Folder holding the persisted vector index
    pub persist_dir: PathBuf,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Chunks retrieved per query
    pub top_k: usize,

    /// Per-chunk character budget inside the prompt
    pub context_chars: usize,

    /// Per-chunk character budget for previews shown to the user
    pub preview_chars: usize,

    /// Embedding gateway settings
    pub embedding: EmbeddingSettings,

    /// Answer generator settings
    pub generation: GenerationSettings,

    /// What to do when retrieval finds nothing
    pub no_results_policy: NoResultsPolicy,

    /// Optional YAML prompt definition replacing the built-in one
    pub prompt_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Embedding gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name: "openai", "ollama" or "mock"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Vector length produced by the model
    pub dimensions: usize,

    /// Custom endpoint (provider default when absent)
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Texts per embedding request during index build
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            batch_size: 100,
        }
    }
}

/// Answer generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Provider name: "groq", "openai" or "ollama"
    pub provider: String,

    /// Model identifier sent with every completion
    pub model: String,

    /// Custom endpoint (provider default when absent)
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Sampling temperature (provider default when absent)
    pub temperature: Option<f32>,

    /// Completion token limit (provider default when absent)
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "openai/gpt-oss-120b".to_string(),
            endpoint: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Behavior when a query retrieves zero chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoResultsPolicy {
    /// Reply with a fixed "no relevant information" message, skip generation
    #[default]
    NoInformation,

    /// Call the generator with empty context and let it use general knowledge
    GeneralKnowledge,
}

impl NoResultsPolicy {
    /// Parse a policy name as written in config or environment.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "no_information" | "none" => Some(Self::NoInformation),
            "general_knowledge" | "fallback" => Some(Self::GeneralKnowledge),
            _ => None,
        }
    }
}

/// Full configuration file structure. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    paths: Option<PathsSection>,
    chunking: Option<ChunkingSection>,
    retrieval: Option<RetrievalSection>,
    embedding: Option<EmbeddingSection>,
    generation: Option<GenerationSection>,
    prompt: Option<PromptSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathsSection {
    data: Option<PathBuf>,
    index: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkingSection {
    size: Option<usize>,
    overlap: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalSection {
    top_k: Option<usize>,
    context_chars: Option<usize>,
    preview_chars: Option<usize>,
    no_results_policy: Option<NoResultsPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PromptSection {
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

/// Command-line values that take precedence over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub persist_dir: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl AppConfig {
    /// Defaults rooted at `workspace`.
    pub fn with_workspace(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        Self {
            data_dir: workspace.join("data"),
            persist_dir: workspace.join(".askdocs").join("index"),
            workspace,
            config_file: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            context_chars: 1000,
            preview_chars: 500,
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
            no_results_policy: NoResultsPolicy::default(),
            prompt_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }

    /// Load configuration from defaults, the config file and the process
    /// environment.
    ///
    /// `workspace` and `config_file` come from the command line when given;
    /// otherwise `ASKDOCS_WORKSPACE` / `ASKDOCS_CONFIG`, then the current
    /// directory and `.askdocs/config.yaml`.
    ///
    /// # Example
    /// ```no_run
    /// use askdocs_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Index: {:?}", config.persist_dir);
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        Self::load_with(workspace, config_file, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an explicit environment lookup.
    pub fn load_with<F>(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        env: F,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let workspace = workspace
            .or_else(|| env("ASKDOCS_WORKSPACE").map(PathBuf::from))
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        if !workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                workspace
            )));
        }

        let mut config = Self::with_workspace(workspace);
        config.config_file = config_file.or_else(|| env("ASKDOCS_CONFIG").map(PathBuf::from));

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.askdocs_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env(env)?;

        Ok(config)
    }

    /// Merge a YAML config file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(paths) = file.paths {
            if let Some(data) = paths.data {
                self.data_dir = self.resolve_path(data);
            }
            if let Some(index) = paths.index {
                self.persist_dir = self.resolve_path(index);
            }
        }

        if let Some(chunking) = file.chunking {
            if let Some(size) = chunking.size {
                self.chunk_size = size;
            }
            if let Some(overlap) = chunking.overlap {
                self.chunk_overlap = overlap;
            }
        }

        if let Some(retrieval) = file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                self.top_k = top_k;
            }
            if let Some(chars) = retrieval.context_chars {
                self.context_chars = chars;
            }
            if let Some(chars) = retrieval.preview_chars {
                self.preview_chars = chars;
            }
            if let Some(policy) = retrieval.no_results_policy {
                self.no_results_policy = policy;
            }
        }

        if let Some(embedding) = file.embedding {
            let target = &mut self.embedding;
            if let Some(provider) = embedding.provider {
                target.provider = provider;
            }
            if let Some(model) = embedding.model {
                target.model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                target.dimensions = dimensions;
            }
            if embedding.endpoint.is_some() {
                target.endpoint = embedding.endpoint;
            }
            if let Some(env) = embedding.api_key_env {
                target.api_key_env = env;
            }
            if let Some(batch_size) = embedding.batch_size {
                target.batch_size = batch_size;
            }
        }

        if let Some(generation) = file.generation {
            let target = &mut self.generation;
            if let Some(provider) = generation.provider {
                target.provider = provider;
            }
            if let Some(model) = generation.model {
                target.model = model;
            }
            if generation.endpoint.is_some() {
                target.endpoint = generation.endpoint;
            }
            if let Some(env) = generation.api_key_env {
                target.api_key_env = env;
            }
            if generation.temperature.is_some() {
                target.temperature = generation.temperature;
            }
            if generation.max_tokens.is_some() {
                target.max_tokens = generation.max_tokens;
            }
        }

        if let Some(prompt) = file.prompt {
            if let Some(file) = prompt.file {
                self.prompt_file = Some(self.resolve_path(file));
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Apply environment variable overrides.
    fn apply_env<F>(&mut self, env: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env("ASKDOCS_DATA_DIR") {
            self.data_dir = self.resolve_path(PathBuf::from(dir));
        }

        if let Some(dir) = env("ASKDOCS_PERSIST_DIR") {
            self.persist_dir = self.resolve_path(PathBuf::from(dir));
        }

        if let Some(top_k) = env("ASKDOCS_TOP_K") {
            self.top_k = top_k.trim().parse().map_err(|_| {
                AppError::Config(format!("ASKDOCS_TOP_K must be a positive integer, got '{}'", top_k))
            })?;
        }

        if let Some(provider) = env("ASKDOCS_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }

        if let Some(model) = env("ASKDOCS_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Some(provider) = env("ASKDOCS_GENERATION_PROVIDER") {
            self.generation.provider = provider;
        }

        if let Some(model) = env("ASKDOCS_MODEL") {
            self.generation.model = model;
        }

        if let Some(policy) = env("ASKDOCS_NO_RESULTS_POLICY") {
            self.no_results_policy = NoResultsPolicy::parse(&policy).ok_or_else(|| {
                AppError::Config(format!("Unknown no-results policy: {}", policy))
            })?;
        }

        if let Some(level) = env("RUST_LOG") {
            self.log_level = Some(level);
        }

        if env("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(dir) = overrides.data_dir {
            self.data_dir = self.resolve_path(dir);
        }

        if let Some(dir) = overrides.persist_dir {
            self.persist_dir = self.resolve_path(dir);
        }

        if let Some(top_k) = overrides.top_k {
            self.top_k = top_k;
        }

        if let Some(model) = overrides.model {
            self.generation.model = model;
        }

        if let Some(level) = overrides.log_level {
            self.log_level = Some(level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Path to the `.askdocs` directory.
    pub fn askdocs_dir(&self) -> PathBuf {
        self.workspace.join(".askdocs")
    }

    /// Resolve the embedding API key from its environment variable.
    pub fn embedding_api_key(&self) -> Option<String> {
        read_secret(&self.embedding.api_key_env)
    }

    /// Resolve the generation API key from its environment variable.
    pub fn generation_api_key(&self) -> Option<String> {
        read_secret(&self.generation.api_key_env)
    }

    /// Validate chunking, retrieval and provider settings.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk size must be greater than 0".to_string()));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("top-k must be at least 1".to_string()));
        }

        if self.context_chars == 0 {
            return Err(AppError::Config(
                "context character budget must be greater than 0".to_string(),
            ));
        }

        let embedding = self.embedding.provider.to_lowercase();
        if !EMBEDDING_PROVIDERS.contains(&embedding.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be greater than 0".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding batch size must be greater than 0".to_string(),
            ));
        }

        let generation = self.generation.provider.to_lowercase();
        if !GENERATION_PROVIDERS.contains(&generation.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                self.generation.provider,
                GENERATION_PROVIDERS.join(", ")
            )));
        }

        Ok(())
    }

    fn resolve_path(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.workspace.join(path)
        }
    }
}

fn read_secret(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
