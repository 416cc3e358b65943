//! Configuration parsing and validation.
//!
//! coderag is configured via a TOML file. The `[store]` section is required;
//! `[embedding]`, `[ingest]`, and `[retrieval]` fall back to defaults that
//! target a local Ollama server and the `java_code` collection.
//!
//! # Example
//!
//! ```toml
//! [store]
//! path = "./data/coderag.sqlite"
//!
//! [embedding]
//! url = "http://localhost:11434"
//! model = "nomic-embed-text:latest"
//! dims = 768
//!
//! [ingest]
//! archive_dir = "./uploads/files"
//! extract_dir = "./temp_extracted"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// SQLite database file. Parent directories are created on open.
    pub path: PathBuf,
    /// Logical collection within the file; collections never see each other.
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_collection() -> String {
    "java_code".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: default_url(),
            model: default_model(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}
fn default_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "nomic-embed-text:latest".to_string()
}
fn default_dims() -> usize {
    768
}
fn default_batch_size() -> usize {
    8
}
fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Directory holding `{project_id}.zip` archives.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
    /// Directory under which each project is extracted to `{project_id}/`.
    #[serde(default = "default_extract_dir")]
    pub extract_dir: PathBuf,
    /// Source file extension, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Delete the project's existing entries before writing new ones.
    #[serde(default)]
    pub replace_existing: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            extract_dir: default_extract_dir(),
            extension: default_extension(),
            exclude_globs: Vec::new(),
            replace_existing: false,
        }
    }
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("./uploads/files")
}
fn default_extract_dir() -> PathBuf {
    PathBuf::from("./temp_extracted")
}
fn default_extension() -> String {
    "java".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_results")]
    pub default_results: usize,
    #[serde(default = "default_score_precision")]
    pub score_precision: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_results: default_results(),
            score_precision: default_score_precision(),
        }
    }
}

fn default_results() -> usize {
    10
}
fn default_score_precision() -> u32 {
    coderag_core::retrieval::DEFAULT_SCORE_PRECISION
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate store
    if config.store.collection.trim().is_empty() {
        anyhow::bail!("store.collection must not be empty");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "ollama" => {}
        other => anyhow::bail!("Unknown embedding provider: '{}'. Must be ollama.", other),
    }
    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.timeout_secs == 0 {
        anyhow::bail!("embedding.timeout_secs must be > 0");
    }
    let url = config.embedding.url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("embedding.url must start with http:// or https://, got '{}'", url);
    }

    // Validate ingest
    if config.ingest.extension.trim().is_empty() {
        anyhow::bail!("ingest.extension must not be empty");
    }

    // Validate retrieval
    if config.retrieval.default_results == 0 {
        anyhow::bail!("retrieval.default_results must be > 0");
    }
    if config.retrieval.score_precision > 10 {
        anyhow::bail!("retrieval.score_precision must be <= 10");
    }

    Ok(config)
}
