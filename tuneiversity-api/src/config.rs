//! Resolved server configuration
//!
//! Merges command-line/environment overrides with the bootstrap TOML file
//! into the settings the server actually runs with.

use std::time::Duration;
use tuneiversity_common::config::{
    resolve_api_key, resolve_database_url, CorsConfig, TomlConfig, DEFAULT_BIND_ADDRESS,
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT,
};

use crate::services::scoring::agent::AgentConfig;

/// Values taken from the command line (clap already folded in env vars)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub database_url: Option<String>,
}

/// HTTP surface settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cors: CorsConfig,
    pub max_upload_bytes: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cors: CorsConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Scoring collaborator settings
#[derive(Debug, Clone)]
pub struct ScoringSettings {
    pub agent: AgentConfig,
    pub mock_delay: Duration,
    pub default_to_mock: bool,
}

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub database_url: String,
    pub log_level: String,
    pub http: HttpSettings,
    pub scoring: ScoringSettings,
}

impl ServerConfig {
    /// CLI/env first, then TOML, then compiled defaults
    pub fn resolve(cli: CliOverrides, toml_config: TomlConfig) -> Self {
        let database_url = resolve_database_url(cli.database_url.as_deref(), &toml_config);
        let api_key = resolve_api_key(&toml_config);
        let scoring = &toml_config.scoring;

        Self {
            bind_address: cli
                .bind_address
                .or_else(|| toml_config.bind_address.clone())
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: cli.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            database_url,
            log_level: toml_config.logging.level.clone(),
            http: HttpSettings {
                cors: toml_config.cors.clone(),
                max_upload_bytes: toml_config
                    .max_upload_bytes
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            scoring: ScoringSettings {
                agent: AgentConfig {
                    api_key,
                    model: scoring.model.clone(),
                    base_url: scoring.base_url.clone(),
                    timeout: Duration::from_secs(scoring.request_timeout_secs),
                },
                mock_delay: Duration::from_millis(scoring.mock_delay_ms),
                default_to_mock: scoring.default_to_mock,
            },
        }
    }

    /// `host:port` to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
