//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tickerlens.toml` files. Secrets (API keys) are never read from the
//! file; they come from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".tickerlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Chunking and summarization bounds.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Web scrape settings.
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Run log settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Ticker to source URL mapping.
    #[serde(default = "default_tickers")]
    pub tickers: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            chunking: ChunkingConfig::default(),
            scraper: ScraperConfig::default(),
            logging: LoggingConfig::default(),
            tickers: default_tickers(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Allowed CORS origin (`*` for any).
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Maximum number of PDF files per request.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origin: default_allowed_origin(),
            max_files: default_max_files(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:4000".to_string()
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

fn default_max_files() -> usize {
    5
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024 // 50MB
}

/// Which wire protocol the model API speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// OpenAI-compatible `/v1/chat/completions`
    #[default]
    Openai,
    /// Ollama `/api/chat`
    Ollama,
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API flavour.
    #[serde(default)]
    pub provider: ModelProvider,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the model API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            name: default_model(),
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout() -> u64 {
    120
}

/// Chunking and summarization bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per scored chunk.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Maximum characters of chunk text copied into the run log.
    #[serde(default = "default_max_log_chunk_chars")]
    pub max_log_chunk_chars: usize,

    /// Maximum chunk justifications embedded in a summary prompt.
    #[serde(default = "default_max_summary_justifications")]
    pub max_summary_justifications: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            max_log_chunk_chars: default_max_log_chunk_chars(),
            max_summary_justifications: default_max_summary_justifications(),
        }
    }
}

fn default_max_chunk_chars() -> usize {
    8000
}

fn default_max_log_chunk_chars() -> usize {
    2000
}

fn default_max_summary_justifications() -> usize {
    10
}

/// Web scrape settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Base URL of the Firecrawl API.
    #[serde(default = "default_scraper_url")]
    pub api_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_scraper_key_env")]
    pub api_key_env: String,

    /// How long a scraped page is reused.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_scraper_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            api_url: default_scraper_url(),
            api_key_env: default_scraper_key_env(),
            cache_ttl_seconds: default_cache_ttl(),
            timeout_seconds: default_scraper_timeout(),
        }
    }
}

fn default_scraper_url() -> String {
    "https://api.firecrawl.dev".to_string()
}

fn default_scraper_key_env() -> String {
    "FIRECRAWL_API_KEY".to_string()
}

fn default_cache_ttl() -> u64 {
    3600 // 1 hour
}

fn default_scraper_timeout() -> u64 {
    60
}

/// Run log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory receiving one `<runId>.log` file per run.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_tickers() -> BTreeMap<String, Vec<String>> {
    let mut tickers = BTreeMap::new();
    tickers.insert(
        "VOLV-B".to_string(),
        vec![
            "https://www.volvogroup.com/en/about-us/strategy.html".to_string(),
            "https://www.volvogroup.com/en/news-and-media.html".to_string(),
            "https://www.google.com/finance/quote/VOLV-B:STO".to_string(),
        ],
    );
    tickers.insert(
        "HM-B".to_string(),
        vec![
            "https://hmgroup.com/media/news/".to_string(),
            "https://www.google.com/finance/quote/HM-B:STO".to_string(),
        ],
    );
    tickers
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.model_url {
            self.model.api_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(max_chunk_chars) = args.max_chunk_chars {
            self.chunking.max_chunk_chars = max_chunk_chars;
        }
        if let Some(ref log_dir) = args.log_dir {
            self.logging.log_dir = log_dir.clone();
        }
        if let Some(ttl) = args.cache_ttl {
            self.scraper.cache_ttl_seconds = ttl;
        }
    }

    /// Look up the source URLs registered for a ticker.
    ///
    /// Keys in `[tickers]` match regardless of case or surrounding spaces.
    pub fn urls_for(&self, ticker: &str) -> Option<&[String]> {
        let ticker = ticker.trim();
        self.tickers
            .get(ticker)
            .or_else(|| {
                self.tickers
                    .iter()
                    .find(|(key, _)| key.trim().eq_ignore_ascii_case(ticker))
                    .map(|(_, urls)| urls)
            })
            .map(Vec::as_slice)
    }

    /// Read the model API key from the configured environment variable.
    pub fn model_api_key(&self) -> Option<String> {
        read_secret(&self.model.api_key_env)
    }

    /// Read the scrape API key from the configured environment variable.
    pub fn scraper_api_key(&self) -> Option<String> {
        read_secret(&self.scraper.api_key_env)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn read_secret(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
