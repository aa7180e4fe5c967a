//! Configuration management for Relief.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.relief/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Every tunable of the retrieval pipeline (neighbour count, similarity
//! threshold, decoding parameters, prompt templates, answer cue) lives here
//! so nothing is hard-coded in the service.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Generation providers with a client implementation.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Embedding providers with an implementation.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "hash"];

/// Main application configuration.
///
/// Built once at startup and then treated as immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .relief/ and the corpus files)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider ("ollama", "openai")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// API key for the generation provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit JSON log lines
    pub json_logs: bool,

    /// Generation provider configurations
    pub llm: Option<LlmConfig>,

    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub embedding: EmbeddingSettings,
    pub corpus: CorpusSettings,
    pub prompts: PromptSettings,
    pub server: ServerSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Settings for one generation provider, keyed by provider name in
/// `llm.providers`.
///
/// The map key selects the backend, so an OpenAI-compatible server without
/// auth (llama.cpp, vLLM, TGI) simply omits `apiKeyEnv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub model: String,

    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the bearer key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

/// Candidate retrieval and relevance gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Number of nearest neighbours retrieved per query
    pub top_k: usize,

    /// Minimum best cosine similarity for a grounded answer (inclusive)
    pub similarity_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 2,
            similarity_threshold: 0.5,
        }
    }
}

/// Decoding parameters and resource limits for the generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Maximum number of generated tokens
    pub max_tokens: u32,

    /// Sampling temperature, passed through to the backend
    pub temperature: f32,

    /// Nucleus sampling mass, passed through to the backend
    pub top_p: f32,

    /// Deadline covering admission and generation, in seconds
    pub timeout_secs: u64,

    /// Generation calls allowed to run at once
    pub max_concurrent: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 250,
            temperature: 0.7,
            top_p: 0.95,
            timeout_secs: 120,
            max_concurrent: 1,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider name: "ollama" or "hash"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions; must match the vector index
    pub dimensions: usize,

    /// Provider endpoint (ollama only)
    pub endpoint: Option<String>,

    /// Parallel embedding requests per batch
    pub concurrency: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            endpoint: None,
            concurrency: 4,
        }
    }
}

/// Location and integrity expectations of the pre-built corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorpusSettings {
    /// FAISS flat-L2 index file (relative paths resolve against the workspace)
    pub index_path: PathBuf,

    /// JSON array of passages aligned with the index
    pub metadata_path: PathBuf,

    /// Start even when the corpus holds no passages
    pub allow_empty: bool,

    /// Expected SHA-256 of the passage contents (hex)
    pub expected_checksum: Option<String>,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("disaster_index.faiss"),
            metadata_path: PathBuf::from("disaster_metadata.json"),
            allow_empty: false,
            expected_checksum: None,
        }
    }
}

/// Prompt template sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptSettings {
    /// Directory holding `<id>.yml` prompt definitions
    pub dir: Option<PathBuf>,

    /// Inline grounded template (overrides the directory and the default)
    pub grounded: Option<String>,

    /// Inline fallback template (overrides the directory and the default)
    pub fallback: Option<String>,

    /// Phrase the grounded template ends with; generated text is split on it
    pub answer_cue: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            dir: None,
            grounded: None,
            fallback: None,
            answer_cue: "Answer:".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    retrieval: Option<RetrievalSettings>,
    generation: Option<GenerationSettings>,
    embedding: Option<EmbeddingSettings>,
    corpus: Option<CorpusSettings>,
    prompts: Option<PromptSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "tinyllama".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            json_logs: false,
            llm: None,
            retrieval: RetrievalSettings::default(),
            generation: GenerationSettings::default(),
            embedding: EmbeddingSettings::default(),
            corpus: CorpusSettings::default(),
            prompts: PromptSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `RELIEF_WORKSPACE`: Override workspace path
    /// - `RELIEF_CONFIG`: Path to config file
    /// - `RELIEF_PROVIDER`: Generation provider
    /// - `RELIEF_MODEL`: Generation model identifier
    /// - `RELIEF_API_KEY`: API key
    /// - `RELIEF_TOP_K`, `RELIEF_SIM_THRESHOLD`, `RELIEF_MAX_TOKENS`
    /// - `RELIEF_HOST`, `RELIEF_PORT`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use relief_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Same as [`AppConfig::load`], with the workspace and config file chosen
    /// by the caller (CLI flags) taking precedence over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("RELIEF_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if let Ok(config_file) = std::env::var("RELIEF_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }
        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.relief_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        config.apply_env()?;

        Ok(config)
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) -> AppResult<()> {
        if let Ok(provider) = std::env::var("RELIEF_PROVIDER") {
            self.provider = provider;
        }

        if let Ok(model) = std::env::var("RELIEF_MODEL") {
            self.model = model;
        }

        if let Ok(key) = std::env::var("RELIEF_API_KEY") {
            self.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if let Some(top_k) = parse_env("RELIEF_TOP_K")? {
            self.retrieval.top_k = top_k;
        }

        if let Some(threshold) = parse_env("RELIEF_SIM_THRESHOLD")? {
            self.retrieval.similarity_threshold = threshold;
        }

        if let Some(max_tokens) = parse_env("RELIEF_MAX_TOKENS")? {
            self.generation.max_tokens = max_tokens;
        }

        if let Ok(host) = std::env::var("RELIEF_HOST") {
            self.server.host = host;
        }

        if let Some(port) = parse_env("RELIEF_PORT")? {
            self.server.port = port;
        }

        // Check for NO_COLOR environment variable
        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.merged(config_file))
    }

    fn merged(&self, config_file: ConfigFile) -> Self {
        let mut result = self.clone();

        // Merge workspace settings
        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        // Merge logging settings
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.json_logs = json;
            }
        }

        // Merge LLM settings
        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }
            result.llm = Some(llm);
        }

        // Whole sections replace the defaults; missing keys keep their defaults
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(corpus) = config_file.corpus {
            result.corpus = corpus;
        }
        if let Some(prompts) = config_file.prompts {
            result.prompts = prompts;
        }
        if let Some(server) = config_file.server {
            result.server = server;
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .relief directory.
    pub fn relief_dir(&self) -> PathBuf {
        self.workspace.join(".relief")
    }

    /// Resolve a configured path against the workspace.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Absolute path of the vector index file.
    pub fn index_path(&self) -> PathBuf {
        self.resolve_path(&self.corpus.index_path)
    }

    /// Absolute path of the passage metadata file.
    pub fn metadata_path(&self) -> PathBuf {
        self.resolve_path(&self.corpus.metadata_path)
    }

    /// Absolute path of the prompt directory, if configured.
    pub fn prompts_dir(&self) -> Option<PathBuf> {
        self.prompts.dir.as_deref().map(|dir| self.resolve_path(dir))
    }

    /// Get the configuration for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint of the active generation provider, if configured.
    pub fn provider_endpoint(&self) -> Option<&str> {
        self.get_provider_config(&self.provider)
            .and_then(ProviderConfig::endpoint)
    }

    /// HTTP timeout for the active generation provider.
    ///
    /// Falls back to the generation deadline when the provider sets none.
    pub fn provider_timeout(&self) -> Duration {
        let secs = self
            .get_provider_config(&self.provider)
            .and_then(|p| p.timeout)
            .unwrap_or(self.generation.timeout_secs);
        Duration::from_secs(secs)
    }

    /// Resolve API key from environment variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        // Check explicit RELIEF_API_KEY first
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        self.get_provider_config(provider)
            .and_then(|p| p.api_key_env.as_deref())
            .and_then(|var| std::env::var(var).ok())
    }

    /// Validate configuration before any component is built.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be at least 1".to_string(),
            ));
        }

        let threshold = self.retrieval.similarity_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(AppError::Config(format!(
                "retrieval.similarityThreshold must be within [-1, 1], got {}",
                threshold
            )));
        }

        let generation = &self.generation;
        if generation.max_tokens == 0 {
            return Err(AppError::Config(
                "generation.maxTokens must be at least 1".to_string(),
            ));
        }
        if generation.temperature < 0.0 {
            return Err(AppError::Config(format!(
                "generation.temperature must not be negative, got {}",
                generation.temperature
            )));
        }
        if !(generation.top_p > 0.0 && generation.top_p <= 1.0) {
            return Err(AppError::Config(format!(
                "generation.topP must be within (0, 1], got {}",
                generation.top_p
            )));
        }
        if generation.max_concurrent == 0 || generation.timeout_secs == 0 {
            return Err(AppError::Config(
                "generation.maxConcurrent and generation.timeoutSecs must be at least 1"
                    .to_string(),
            ));
        }

        if self.prompts.answer_cue.trim().is_empty() {
            return Err(AppError::Config(
                "prompts.answerCue must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse an optional environment variable into `T`.
fn parse_env<T>(name: &str) -> AppResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
