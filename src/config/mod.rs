//! Configuration management
//!
//! This module handles loading and parsing configuration for DevConnect.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token signing configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Text-completion collaborator configuration
    #[serde(default)]
    pub ai: AiConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/devconnect.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Session token configuration.
///
/// The secret is read once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret. When absent a random key is generated per process.
    #[serde(default)]
    pub token_secret: Option<String>,
    /// Token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_token_ttl_hours() -> i64 {
    120
}

/// Text-completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// API key for the completion service
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Base URL of the completion API
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_ai_model(),
            endpoint: default_ai_endpoint(),
            timeout_seconds: default_ai_timeout(),
        }
    }
}

fn default_ai_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_timeout() -> u64 {
    30
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - DEVCONNECT_SERVER_HOST / DEVCONNECT_SERVER_PORT / DEVCONNECT_SERVER_CORS_ORIGIN
    /// - DEVCONNECT_DATABASE_DRIVER / DEVCONNECT_DATABASE_URL / DEVCONNECT_DATABASE_MAX_CONNECTIONS
    /// - DEVCONNECT_AUTH_TOKEN_SECRET / DEVCONNECT_AUTH_TOKEN_TTL_HOURS
    /// - DEVCONNECT_AI_API_KEY / DEVCONNECT_AI_MODEL / DEVCONNECT_AI_ENDPOINT / DEVCONNECT_AI_TIMEOUT_SECONDS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("DEVCONNECT_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DEVCONNECT_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("DEVCONNECT_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Database configuration
        if let Ok(driver) = std::env::var("DEVCONNECT_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("DEVCONNECT_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("DEVCONNECT_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = max;
            }
        }

        // Auth configuration
        if let Ok(secret) = std::env::var("DEVCONNECT_AUTH_TOKEN_SECRET") {
            self.auth.token_secret = Some(secret);
        }
        if let Ok(ttl) = std::env::var("DEVCONNECT_AUTH_TOKEN_TTL_HOURS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                self.auth.token_ttl_hours = ttl;
            }
        }

        // AI configuration
        if let Ok(key) = std::env::var("DEVCONNECT_AI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("DEVCONNECT_AI_MODEL") {
            self.ai.model = model;
        }
        if let Ok(endpoint) = std::env::var("DEVCONNECT_AI_ENDPOINT") {
            self.ai.endpoint = endpoint;
        }
        if let Ok(timeout) = std::env::var("DEVCONNECT_AI_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.ai.timeout_seconds = timeout;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
