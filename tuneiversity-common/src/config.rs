//! Bootstrap configuration loading
//!
//! Values are resolved in priority order:
//! 1. Command-line argument (clap merges the matching environment variable here)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the service logs a warning and starts
//! with defaults. A TOML file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port (the front end proxies `/api/*` here)
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default SQLite database URL (created on first run)
pub const DEFAULT_DATABASE_URL: &str = "sqlite://tuneiversity.db?mode=rwc";

/// Default upload limit for `POST /api/score` bodies (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default hosted model used by the scoring agent
pub const DEFAULT_AGENT_MODEL: &str = "gemini-2.5-flash";

/// Default base URL of the hosted model API
pub const DEFAULT_AGENT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TUNEIVERSITY_CONFIG";

/// Environment variable holding the hosted agent credential
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional in the file; see the `DEFAULT_*` constants.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// SQLite database URL
    #[serde(default)]
    pub database_url: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// HTTP bind address
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Maximum accepted request body size in bytes
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Cross-origin access configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Scoring collaborator configuration
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Cross-origin access configuration
///
/// An empty list, or a list containing `"*"`, allows any origin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// True when every origin is allowed
    pub fn is_permissive(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Scoring collaborator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Hosted agent API key (the environment variable takes priority)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Hosted model name
    #[serde(default = "default_agent_model")]
    pub model: String,

    /// Hosted model API base URL
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Simulated latency of the mock strategy in milliseconds
    #[serde(default = "default_mock_delay_ms")]
    pub mock_delay_ms: u64,

    /// Strategy used when a request does not say which one it wants
    #[serde(default = "default_to_mock")]
    pub default_to_mock: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_agent_model(),
            base_url: default_agent_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            mock_delay_ms: default_mock_delay_ms(),
            default_to_mock: default_to_mock(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_agent_model() -> String {
    DEFAULT_AGENT_MODEL.to_string()
}

fn default_agent_base_url() -> String {
    DEFAULT_AGENT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_mock_delay_ms() -> u64 {
    3000
}

fn default_to_mock() -> bool {
    true
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse TOML config text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load the config file if there is one, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                let config = Self::load(path)?;
                info!("Loaded config file: {}", path.display());
                Ok(config)
            }
            Some(path) => {
                warn!("Config file not found: {} (using defaults)", path.display());
                Ok(Self::default())
            }
            None => {
                warn!("No config file location available (using defaults)");
                Ok(Self::default())
            }
        }
    }
}

/// Platform config file location: `<config_dir>/tuneiversity/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tuneiversity").join("config.toml"))
}

/// Resolve which config file to read
///
/// Command-line argument, then `TUNEIVERSITY_CONFIG`, then the platform default.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Resolve the database URL: CLI/env value, then TOML, then default
pub fn resolve_database_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> String {
    cli_arg
        .map(str::to_string)
        .or_else(|| toml_config.database_url.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Resolve the hosted agent API key
///
/// **Priority:** ENV → TOML. Returns `None` when neither holds a usable key;
/// the caller decides whether that is fatal (it is not: the mock still works).
pub fn resolve_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .scoring
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Agent API key found in both {} and TOML config. Using environment (highest priority).",
            API_KEY_ENV
        );
    }

    if let Some(key) = env_key {
        info!("Agent API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("Agent API key loaded from TOML config");
        return Some(key);
    }

    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
