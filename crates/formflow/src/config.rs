// File: src/config.rs
// Purpose: Configuration parsing from formflow.toml, with environment overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub accounts: AccountsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite:formflow.db`, `sqlite::memory:` or `postgres://...`
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Account flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,

    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_minutes: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive
    #[serde(default = "default_filter")]
    pub filter: String,
}

// Default values
fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_database_url() -> String {
    "sqlite:formflow.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_password_min_length() -> usize {
    8
}

fn default_reset_token_ttl() -> i64 {
    60
}

fn default_filter() -> String {
    "info,formflow=debug".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            password_min_length: default_password_min_length(),
            reset_token_ttl_minutes: default_reset_token_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./formflow.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("formflow.toml")
    }

    /// Apply `DATABASE_URL`, `FORMFLOW_HOST`, `FORMFLOW_PORT` and `FORMFLOW_LOG`
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(host) = lookup("FORMFLOW_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("FORMFLOW_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("FORMFLOW_PORT is not a port number: {}", port))?;
        }
        if let Some(filter) = lookup("FORMFLOW_LOG") {
            self.logging.filter = filter;
        }
        Ok(self)
    }

    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
