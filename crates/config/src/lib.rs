//! Configuration loading, validation, and management for LoreWiki.
//!
//! Loads configuration from `./lorewiki.toml` (or `~/.lorewiki/config.toml`)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the project-local config file.
pub const LOCAL_CONFIG_FILE: &str = "lorewiki.toml";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model, used for both the agent and the update passes
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Wiki building behavior
    #[serde(default)]
    pub wiki: WikiConfig,

    /// Input documents and chunking
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-1.5-pro".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    8192
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("wiki", &self.wiki)
            .field("ingest", &self.ingest)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Display name of the wiki
    #[serde(default = "default_wiki_name")]
    pub name: String,

    /// How many previous chunk summaries are shown to the agent
    #[serde(default = "default_prev_chunks")]
    pub use_n_prev_chunks: usize,

    /// Attempts per chunk before the run is aborted
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds one agent call may take before it counts as a failed attempt
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Root of the markdown tree
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_wiki_name() -> String {
    "LoreWiki".into()
}
fn default_prev_chunks() -> usize {
    5
}
fn default_max_retries() -> u32 {
    10
}
fn default_request_timeout_secs() -> u64 {
    180
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./wiki_data")
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            name: default_wiki_name(),
            use_n_prev_chunks: default_prev_chunks(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory holding the narrative text files
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Chunk size in (estimated) tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in (estimated) tokens
    #[serde(default)]
    pub chunk_overlap: usize,

    /// Number of leading chunks to skip (front matter, table of contents)
    #[serde(default)]
    pub skip: usize,

    /// Maximum number of chunks to process (None = all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("./input_docs")
}
fn default_chunk_size() -> usize {
    2048
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            skip: 0,
            limit: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// `./lorewiki.toml` wins over `~/.lorewiki/config.toml`. Environment
    /// variables are checked for API keys:
    /// - `LOREWIKI_API_KEY` (highest priority)
    /// - `GEMINI_API_KEY`
    /// - `OPENAI_API_KEY`
    /// - `OPENROUTER_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::default_path())
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("LOREWIKI_API_KEY")
                .ok()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("LOREWIKI_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("LOREWIKI_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// The config file that `load()` reads.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            local
        } else {
            Self::config_dir().join("config.toml")
        }
    }

    /// Get the global configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lorewiki")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.wiki.use_n_prev_chunks == 0 {
            return Err(ConfigError::ValidationError(
                "wiki.use_n_prev_chunks must be at least 1".into(),
            ));
        }

        if self.wiki.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "wiki.max_retries must be at least 1".into(),
            ));
        }

        if self.wiki.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "wiki.request_timeout_secs must be at least 1".into(),
            ));
        }

        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_size must be > 0".into(),
            ));
        }

        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_overlap must be smaller than ingest.chunk_size".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            wiki: WikiConfig::default(),
            ingest: IngestConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.wiki.use_n_prev_chunks, 5);
        assert_eq!(config.wiki.max_retries, 10);
        assert_eq!(config.ingest.chunk_size, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.wiki.output_dir, config.wiki.output_dir);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.ingest.chunk_size = 100;
        config.ingest.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_summary_window_rejected() {
        let mut config = AppConfig::default();
        config.wiki.use_n_prev_chunks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_request_timeout_rejected() {
        let mut config = AppConfig::default();
        assert_eq!(config.wiki.request_timeout_secs, 180);
        config.wiki.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/lorewiki.toml"));
        let config = result.unwrap();
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn loads_partial_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lorewiki.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o"

[wiki]
name = "LotmWiki"
use_n_prev_chunks = 3
request_timeout_secs = 30

[ingest]
input_dir = "./books"
skip = 3
limit = 5
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.wiki.name, "LotmWiki");
        assert_eq!(config.wiki.use_n_prev_chunks, 3);
        assert_eq!(config.wiki.max_retries, 10);
        assert_eq!(config.wiki.request_timeout_secs, 30);
        assert_eq!(config.ingest.input_dir, PathBuf::from("./books"));
        assert_eq!(config.ingest.skip, 3);
        assert_eq!(config.ingest.limit, Some(5));
        assert_eq!(config.ingest.chunk_size, 2048);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lorewiki.toml");
        std::fs::write(&path, "default_model = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini"));
        assert!(toml_str.contains("use_n_prev_chunks"));
    }
}
