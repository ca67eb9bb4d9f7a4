//! Configuration for the fact checker.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (FACTCHECK_HOME, FACTCHECK_STORE_PATH, ...)
//! 2. Config file (.factcheck/config.yaml)
//! 3. Defaults (~/.factcheck)
//!
//! Config file discovery:
//! - Searches current directory and parents for .factcheck/config.yaml
//! - Paths in config file are relative to the project root (parent of .factcheck/)
//!
//! Settings are loaded explicitly and handed to constructors; nothing is
//! cached process-wide.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::RetryPolicy;
use crate::store::DistanceMetric;

/// Directory holding the config file
pub const CONFIG_DIR: &str = ".factcheck";

/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub verification: VerificationSettings,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub log_level: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to project root)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    pub path: Option<String>,
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    pub batch_size: Option<usize>,
    pub csv_path: Option<String>,
}

/// Embedding backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimension every stored embedding must have
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// OpenAI-compatible endpoint root (POST {base_url}/embeddings)
    #[serde(default = "default_embedding_url")]
    pub base_url: String,

    #[serde(default = "default_true")]
    pub normalize: bool,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_seconds: u64,
}

fn default_embedding_model() -> String {
    "BAAI/bge-small-en-v1.5".to_string()
}
fn default_dimension() -> usize {
    384
}
fn default_embedding_url() -> String {
    "http://localhost:8080/v1".to_string()
}
fn default_true() -> bool {
    true
}
fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_dimension(),
            base_url: default_embedding_url(),
            normalize: true,
            timeout_seconds: default_embedding_timeout(),
        }
    }
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Retrieval and reranking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,

    #[serde(default = "default_top_k_retrieval")]
    pub top_k_retrieval: usize,

    #[serde(default = "default_top_k_rerank")]
    pub top_k_rerank: usize,

    #[serde(default)]
    pub metric: DistanceMetric,

    /// Ask the language model to rerank candidates
    #[serde(default = "default_true")]
    pub llm_rerank: bool,
}

fn default_threshold() -> f32 {
    0.65
}
fn default_top_k_retrieval() -> usize {
    5
}
fn default_top_k_rerank() -> usize {
    3
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: default_threshold(),
            top_k_retrieval: default_top_k_retrieval(),
            top_k_rerank: default_top_k_rerank(),
            metric: DistanceMetric::default(),
            llm_rerank: true,
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_llm_url")]
    pub base_url: String,

    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

fn default_llm_model() -> String {
    "claude-haiku-4-5-20251001".to_string()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_llm_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}
fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            base_url: default_llm_url(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Claim-level verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSettings {
    /// Claims verified at once (1 = sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_claim_timeout")]
    pub claim_timeout_seconds: u64,

    /// Confidence considered actionable in summaries
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

fn default_concurrency() -> usize {
    1
}
fn default_claim_timeout() -> u64 {
    120
}
fn default_confidence_threshold() -> f64 {
    0.6
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            claim_timeout_seconds: default_claim_timeout(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl VerificationSettings {
    pub fn claim_timeout(&self) -> Duration {
        Duration::from_secs(self.claim_timeout_seconds)
    }
}

/// Evidence store location
#[derive(Debug, Clone, Serialize)]
pub struct StoreSettings {
    /// Directory holding the database file
    pub path: PathBuf,
    pub collection: String,
}

/// Ingestion settings
#[derive(Debug, Clone, Serialize)]
pub struct IngestSettings {
    pub batch_size: usize,
    pub csv_path: PathBuf,
}

/// Default collection name
pub const DEFAULT_COLLECTION: &str = "verified_facts";

/// Default ingestion batch size
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// State directory
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub store: StoreSettings,
    pub verification: VerificationSettings,
    pub retry: RetryPolicy,
    pub ingest: IngestSettings,
    pub log_level: String,
}

impl Settings {
    /// Defaults rooted at the given state directory
    pub fn with_home(home: PathBuf) -> Self {
        Self {
            store: StoreSettings {
                path: home.join("store"),
                collection: DEFAULT_COLLECTION.to_string(),
            },
            ingest: IngestSettings {
                batch_size: DEFAULT_BATCH_SIZE,
                csv_path: home.join("verified_facts.csv"),
            },
            home,
            config_file: None,
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            llm: LlmSettings::default(),
            verification: VerificationSettings::default(),
            retry: RetryPolicy::default(),
            log_level: "info".to_string(),
        }
    }

    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        let config_file = find_config_file();
        Self::load_from(config_file.as_deref())
    }

    /// Load from an explicit config file (or defaults), then apply env overrides
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let env_home = std::env::var("FACTCHECK_HOME").ok();
        let mut settings = match config_path {
            Some(path) => {
                let config = load_config_file(path)?;
                // Project root is the parent of .factcheck/
                let base_dir = path
                    .parent()
                    .and_then(|p| p.parent())
                    .unwrap_or(Path::new("."))
                    .to_path_buf();
                let mut settings =
                    Self::from_config(config, &base_dir, env_home.as_deref())?;
                settings.config_file = Some(path.to_path_buf());
                settings
            }
            None => {
                let home = match env_home {
                    Some(home) => PathBuf::from(home),
                    None => default_home()?,
                };
                Self::with_home(home)
            }
        };

        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve a parsed config file against its project root
    pub fn from_config(config: ConfigFile, base_dir: &Path, home_override: Option<&str>) -> Result<Self> {
        let home = match (home_override, config.paths.home.as_deref()) {
            (Some(home), _) => PathBuf::from(home),
            (None, Some(home)) => resolve_path(base_dir, home),
            (None, None) => default_home()?,
        };

        let mut settings = Self::with_home(home);
        settings.embedding = config.embedding;
        settings.retrieval = config.retrieval;
        settings.llm = config.llm;
        settings.verification = config.verification;
        settings.retry = config.retry;

        if let Some(ref path) = config.store.path {
            settings.store.path = resolve_path(base_dir, path);
        }
        if let Some(collection) = config.store.collection {
            settings.store.collection = collection;
        }
        if let Some(batch_size) = config.ingest.batch_size {
            settings.ingest.batch_size = batch_size;
        }
        if let Some(ref csv_path) = config.ingest.csv_path {
            settings.ingest.csv_path = resolve_path(base_dir, csv_path);
        }
        if let Some(level) = config.log_level {
            settings.log_level = level;
        }

        Ok(settings)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("FACTCHECK_STORE_PATH") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(url) = lookup("FACTCHECK_EMBEDDING_URL") {
            self.embedding.base_url = url;
        }
        if let Some(model) = lookup("FACTCHECK_LLM_MODEL") {
            self.llm.model = model;
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.retrieval.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!(
                "retrieval.similarity_threshold must be within [0, 1], got {}",
                threshold
            );
        }
        if self.retrieval.top_k_retrieval == 0 || self.retrieval.top_k_rerank == 0 {
            anyhow::bail!("retrieval.top_k_retrieval and retrieval.top_k_rerank must be at least 1");
        }
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding.dimension must be at least 1");
        }
        if self.verification.concurrency == 0 {
            anyhow::bail!("verification.concurrency must be at least 1");
        }
        if self.verification.claim_timeout_seconds == 0 {
            anyhow::bail!("verification.claim_timeout_seconds must be at least 1");
        }
        if self.ingest.batch_size == 0 {
            anyhow::bail!("ingest.batch_size must be at least 1");
        }
        if self.store.collection.trim().is_empty() {
            anyhow::bail!("store.collection cannot be empty");
        }
        Ok(())
    }
}

/// Default state directory (~/.factcheck)
fn default_home() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR))
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
version: "1.0"
paths:
  home: ./state
embedding:
  model: BAAI/bge-base-en-v1.5
  dimension: 768
retrieval:
  similarity_threshold: 0.7
  top_k_retrieval: 8
  metric: cosine
llm:
  max_tokens: 1024
store:
  path: data/chroma
  collection: news_facts
verification:
  concurrency: 4
ingest:
  batch_size: 20
log_level: debug
"#;

    #[test]
    fn test_defaults() {
        let settings = Settings::with_home(PathBuf::from("/tmp/fc"));

        assert_eq!(settings.embedding.dimension, 384);
        assert_eq!(settings.embedding.model, "BAAI/bge-small-en-v1.5");
        assert_eq!(settings.retrieval.similarity_threshold, 0.65);
        assert_eq!(settings.retrieval.top_k_retrieval, 5);
        assert_eq!(settings.retrieval.top_k_rerank, 3);
        assert_eq!(settings.retrieval.metric, DistanceMetric::Cosine);
        assert_eq!(settings.llm.model, "claude-haiku-4-5-20251001");
        assert_eq!(settings.llm.max_tokens, 4096);
        assert_eq!(settings.llm.temperature, 0.0);
        assert_eq!(settings.store.path, PathBuf::from("/tmp/fc/store"));
        assert_eq!(settings.store.collection, "verified_facts");
        assert_eq!(settings.verification.concurrency, 1);
        assert_eq!(settings.ingest.batch_size, 50);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "{}", FULL_CONFIG).unwrap();

        let config = load_config_file(&config_path).unwrap();
        let settings = Settings::from_config(config, temp.path(), None).unwrap();

        assert_eq!(settings.home, temp.path().join("./state"));
        assert_eq!(settings.embedding.dimension, 768);
        // Unset keys within a section keep their defaults
        assert_eq!(settings.embedding.base_url, "http://localhost:8080/v1");
        assert_eq!(settings.retrieval.similarity_threshold, 0.7);
        assert_eq!(settings.retrieval.top_k_retrieval, 8);
        assert_eq!(settings.retrieval.top_k_rerank, 3);
        assert_eq!(settings.llm.max_tokens, 1024);
        assert_eq!(settings.store.path, temp.path().join("data/chroma"));
        assert_eq!(settings.store.collection, "news_facts");
        assert_eq!(settings.verification.concurrency, 4);
        assert_eq!(settings.ingest.batch_size, 20);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let yaml = "retrieval:\n  metric: l2\n";
        let parsed: Result<ConfigFile, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_home_override_wins() {
        let config: ConfigFile = serde_yaml::from_str(FULL_CONFIG).unwrap();
        let settings =
            Settings::from_config(config, Path::new("/project"), Some("/override")).unwrap();
        assert_eq!(settings.home, PathBuf::from("/override"));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::with_home(PathBuf::from("/tmp/fc"));
        settings.apply_overrides(|key| match key {
            "FACTCHECK_STORE_PATH" => Some("/var/lib/facts".to_string()),
            "FACTCHECK_LLM_MODEL" => Some("claude-sonnet-4-5".to_string()),
            _ => None,
        });

        assert_eq!(settings.store.path, PathBuf::from("/var/lib/facts"));
        assert_eq!(settings.llm.model, "claude-sonnet-4-5");
        assert_eq!(settings.embedding.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::with_home(PathBuf::from("/tmp/fc"));
        settings.retrieval.similarity_threshold = 1.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::with_home(PathBuf::from("/tmp/fc"));
        settings.retrieval.top_k_rerank = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::with_home(PathBuf::from("/tmp/fc"));
        settings.verification.concurrency = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::with_home(PathBuf::from("/tmp/fc"));
        settings.verification.claim_timeout_seconds = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("claim_timeout_seconds"));

        let settings = Settings::with_home(PathBuf::from("/tmp/fc"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
