//! Configuration management for Tableside.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - The workspace config file (`.tableside/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Relative directories in the config are resolved against the workspace.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".tableside";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .tableside/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    pub corpus: CorpusSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub answer: AnswerSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub server: ServerSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit JSON log lines
    pub log_json: bool,
}

/// Where the corpus lives and how often it is polled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorpusSettings {
    pub data_dir: PathBuf,
    pub poll_interval_secs: u64,
    /// Lowercase file extensions (without dot) that belong to the corpus
    pub extensions: Vec<String>,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            poll_interval_secs: 5,
            extensions: ["csv", "xls", "xlsx", "jsonl"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Chunking and persistence of index generations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexSettings {
    pub storage_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(STATE_DIR).join("storage"),
            chunk_size: 512,
            chunk_overlap: 64,
        }
    }
}

/// Confidence gate parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub similarity_threshold: f32,
    /// Characters of the top chunk handed to the generator
    pub context_chars: usize,
    /// Fold the remaining chunks in with one refinement call
    pub refine: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 2,
            similarity_threshold: 0.15,
            context_chars: 400,
            refine: false,
        }
    }
}

/// Output caps enforced by the sanitizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnswerSettings {
    pub max_sentences: usize,
    pub max_chars: usize,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            max_sentences: 3,
            max_chars: 250,
        }
    }
}

/// Text-generation service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "tinyllama".to_string(),
            temperature: 0.1,
            max_tokens: 256,
            timeout_secs: 120,
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// "ollama" or "mock"
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_secs: 30,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11435,
            cors_origins: Vec::new(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    corpus: Option<CorpusSettings>,
    index: Option<IndexSettings>,
    retrieval: Option<RetrievalSettings>,
    answer: Option<AnswerSettings>,
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    server: Option<ServerSettings>,
    logging: Option<LoggingConfig>,
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
            corpus: CorpusSettings::default(),
            index: IndexSettings::default(),
            retrieval: RetrievalSettings::default(),
            answer: AnswerSettings::default(),
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            server: ServerSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `TABLESIDE_WORKSPACE`: Override workspace path
    /// - `TABLESIDE_CONFIG`: Path to config file
    /// - `TABLESIDE_DATA_DIR`: Corpus directory
    /// - `TABLESIDE_PORT`: HTTP port
    /// - `TABLESIDE_MODEL`: Generation model
    /// - `TABLESIDE_OLLAMA_URL`: Ollama endpoint for generation and embeddings
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use tableside_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Corpus: {:?}", config.data_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        let workspace = std::env::var("TABLESIDE_WORKSPACE").ok().map(PathBuf::from);
        let config_file = std::env::var("TABLESIDE_CONFIG").ok().map(PathBuf::from);
        Self::load_with(workspace, config_file)
    }

    /// Load configuration for an explicit workspace and config file.
    ///
    /// `None` falls back to the current directory and
    /// `<workspace>/.tableside/config.yaml` respectively.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
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
        if let Ok(data_dir) = std::env::var("TABLESIDE_DATA_DIR") {
            self.corpus.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(port) = std::env::var("TABLESIDE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid TABLESIDE_PORT: {}", port)))?;
        }

        if let Ok(model) = std::env::var("TABLESIDE_MODEL") {
            self.llm.model = model;
        }

        if let Ok(url) = std::env::var("TABLESIDE_OLLAMA_URL") {
            self.llm.endpoint = url.clone();
            self.embedding.endpoint = url;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

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

        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        let mut result = self.clone();

        if let Some(corpus) = config_file.corpus {
            result.corpus = corpus;
        }
        if let Some(index) = config_file.index {
            result.index = index;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(answer) = config_file.answer {
            result.answer = answer;
        }
        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(server) = config_file.server {
            result.server = server;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.corpus.data_dir = data_dir;
        }

        if let Some(model) = model {
            self.llm.model = model;
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

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .tableside directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Corpus directory, resolved against the workspace.
    pub fn data_dir(&self) -> PathBuf {
        self.workspace.join(&self.corpus.data_dir)
    }

    /// Generation storage directory, resolved against the workspace.
    pub fn storage_dir(&self) -> PathBuf {
        self.workspace.join(&self.index.storage_dir)
    }

    /// Ensure the .tableside directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Validate settings that would otherwise fail deep inside a component.
    pub fn validate(&self) -> AppResult<()> {
        if self.index.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }

        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }

        if !(0.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(AppError::Config(format!(
                "similarityThreshold must be within [0, 1], got {}",
                self.retrieval.similarity_threshold
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        if self.answer.max_sentences == 0 || self.answer.max_chars == 0 {
            return Err(AppError::Config(
                "answer caps must be positive".to_string(),
            ));
        }

        if self.corpus.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "pollIntervalSecs must be positive".to_string(),
            ));
        }

        let known_llm = ["ollama"];
        if !known_llm.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                known_llm.join(", ")
            )));
        }

        let known_embedding = ["ollama", "mock"];
        if !known_embedding.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_embedding.join(", ")
            )));
        }

        Ok(())
    }
}
