//! Sync configuration file support
//!
//! Handles parsing of `sync_config.json` configuration files and
//! environment variable overrides for the host URL and API key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default configuration filename
pub const CONFIG_FILENAME: &str = "sync_config.json";

/// Default directory searched for the configuration file
pub const CONFIG_DIR: &str = "config";

/// Environment variable overriding the configuration file path
pub const ENV_CONFIG_PATH: &str = "ELN_SYNC_CONFIG";

/// Environment variable overriding the API host URL
pub const ENV_HOST_URL: &str = "ELN_SYNC_HOST";

/// Environment variable overriding the API key
pub const ENV_API_KEY: &str = "ELN_SYNC_API_KEY";

/// Error loading or parsing configuration.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ConfigError {
    #[error("Config file not found: {0} (set {ENV_CONFIG_PATH} to override the path)")]
    NotFound(String),
    #[error("Failed to read config: {0}")]
    Io(String),
    #[error("Failed to parse config {0}: {1}")]
    Parse(String, String),
}

/// API connection section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the remote API, including the version prefix
    #[serde(default)]
    pub host_url: String,

    /// API key sent in the Authorization header
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Import behaviour section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// CSV columns mapped onto top-level record attributes rather than
    /// extra fields
    #[serde(default = "default_known_post_fields")]
    pub known_post_fields: Vec<String>,

    /// Header spellings recognized as the attachment-path column
    #[serde(default = "default_path_col_aliases")]
    pub path_col_aliases: Vec<String>,

    /// Date formats tried in order when normalizing date cells
    #[serde(default = "default_date_patterns")]
    pub date_patterns: Vec<String>,

    /// Files per multipart upload batch
    #[serde(default = "default_upload_chunk_size")]
    pub upload_chunk_size: usize,

    /// Create a free-text extra field for CSV columns with no matching
    /// field definition instead of skipping them
    #[serde(default)]
    pub promote_unknown_columns: bool,

    /// Base directory that relative attachment paths are resolved against
    #[serde(default)]
    pub attachment_base_dir: Option<PathBuf>,
}

fn default_known_post_fields() -> Vec<String> {
    ["title", "tags", "category", "template", "body"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_path_col_aliases() -> Vec<String> {
    [
        "files_path",
        "file_path",
        "attachments_path",
        "attachments",
        "folder with attachments",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_date_patterns() -> Vec<String> {
    ["%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d", "%d-%m-%Y"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_upload_chunk_size() -> usize {
    10
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            known_post_fields: default_known_post_fields(),
            path_col_aliases: default_path_col_aliases(),
            date_patterns: default_date_patterns(),
            upload_chunk_size: default_upload_chunk_size(),
            promote_unknown_columns: false,
            attachment_base_dir: None,
        }
    }
}

/// Main configuration structure
///
/// Represents the `sync_config.json` configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Import behaviour settings
    #[serde(default)]
    pub import: ImportConfig,
}

impl SyncConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from an explicit file path.
    ///
    /// Environment variable overrides are applied after parsing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let mut config = Self::parse(&content)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Uses the path in `ELN_SYNC_CONFIG` when set, otherwise
    /// `config/sync_config.json` relative to the working directory.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => Path::new(CONFIG_DIR).join(CONFIG_FILENAME),
        };
        Self::load(&path)
    }

    /// Parse configuration from a JSON string
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Save configuration to a file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var(ENV_HOST_URL)
            && !host.is_empty()
        {
            self.api.host_url = host;
        }
        if let Ok(key) = std::env::var(ENV_API_KEY)
            && !key.is_empty()
        {
            self.api.api_key = key;
        }
    }
}

/// Default configuration object, for writing a starter config file.
pub fn sample_config() -> SyncConfig {
    SyncConfig::default()
}
