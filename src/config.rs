//! TOML configuration parsing and validation.
//!
//! The whole service is configured from one file (default
//! `./config/docsift.toml`). Only `[db]` and `[server]` are required; every
//! other section falls back to defaults.
//!
//! ```toml
//! [db]
//! path = "./data/docsift.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:8082"
//!
//! [source]
//! kind = "http"
//! base_url = "http://file-storing-service:8081"
//! timeout_secs = 10
//!
//! [similarity]
//! method = "word_overlap"
//! threshold = 5.0
//! max_matches = 5
//!
//! [wordcloud]
//! provider = "http"
//! url = "http://word-cloud-service:8083/api/wordcloud"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docsift_core::similarity::{ScoringMethod, SimilarityParams, MAX_MATCHES};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub wordcloud: WordCloudConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// Which [`ResultStore`](docsift_core::store::ResultStore) backend to build.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The file-storing service's `/files/{id}` protocol.
    #[default]
    Http,
    /// Documents are files under `source.root`; the id is the relative path.
    Filesystem,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Http,
            base_url: None,
            root: None,
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            timeout_secs: default_source_timeout(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.md".to_string()]
}
fn default_source_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimilarityConfig {
    #[serde(default)]
    pub method: ScoringMethod,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
    #[serde(default = "default_similarity_timeout")]
    pub timeout_secs: u64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            method: ScoringMethod::WordOverlap,
            threshold: default_threshold(),
            max_matches: default_max_matches(),
            timeout_secs: default_similarity_timeout(),
        }
    }
}

fn default_threshold() -> f64 {
    docsift_core::similarity::DEFAULT_THRESHOLD
}
fn default_max_matches() -> usize {
    MAX_MATCHES
}
fn default_similarity_timeout() -> u64 {
    5
}

impl SimilarityConfig {
    pub fn params(&self) -> SimilarityParams {
        SimilarityParams {
            threshold: self.threshold,
            max_matches: self.max_matches,
            method: self.method,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WordCloudConfig {
    #[serde(default = "default_wordcloud_provider")]
    pub provider: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_wordcloud_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_max_words")]
    pub max_words: u32,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            provider: default_wordcloud_provider(),
            url: None,
            timeout_secs: default_wordcloud_timeout(),
            width: default_width(),
            height: default_height(),
            max_words: default_max_words(),
        }
    }
}

fn default_wordcloud_provider() -> String {
    "disabled".to_string()
}
fn default_wordcloud_timeout() -> u64 {
    10
}
fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_max_words() -> u32 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Add every successfully analyzed document to the comparison corpus.
    #[serde(default = "default_index_on_analyze")]
    pub index_on_analyze: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            index_on_analyze: default_index_on_analyze(),
        }
    }
}

fn default_index_on_analyze() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// An all-defaults configuration with an in-memory store.
    ///
    /// Useful for tests and embedding the analyzer without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/docsift.sqlite"),
            },
            server: ServerConfig {
                bind: "127.0.0.1:8082".to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
            source: SourceConfig::default(),
            similarity: SimilarityConfig::default(),
            wordcloud: WordCloudConfig::default(),
            corpus: CorpusConfig::default(),
            log: LogConfig::default(),
        }
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Check cross-field constraints that serde cannot express.
pub fn validate(config: &Config) -> Result<()> {
    // Source
    match config.source.kind {
        SourceKind::Http => {
            if config.source.base_url.as_deref().map_or(true, str::is_empty) {
                bail!("source.base_url must be set when source.kind is 'http'");
            }
        }
        SourceKind::Filesystem => {
            if config.source.root.is_none() {
                bail!("source.root must be set when source.kind is 'filesystem'");
            }
        }
    }
    if config.source.timeout_secs == 0 {
        bail!("source.timeout_secs must be > 0");
    }

    // Similarity
    if !(0.0..100.0).contains(&config.similarity.threshold) {
        bail!("similarity.threshold must be in [0.0, 100.0)");
    }
    if config.similarity.max_matches == 0 || config.similarity.max_matches > MAX_MATCHES {
        bail!("similarity.max_matches must be between 1 and {}", MAX_MATCHES);
    }
    if config.similarity.timeout_secs == 0 {
        bail!("similarity.timeout_secs must be > 0");
    }

    // Word cloud
    match config.wordcloud.provider.as_str() {
        "disabled" => {}
        "http" => {
            if config.wordcloud.url.as_deref().map_or(true, str::is_empty) {
                bail!("wordcloud.url must be set when provider is 'http'");
            }
        }
        other => bail!(
            "Unknown wordcloud provider: '{}'. Must be disabled or http.",
            other
        ),
    }
    if config.wordcloud.timeout_secs == 0 {
        bail!("wordcloud.timeout_secs must be > 0");
    }

    Ok(())
}
