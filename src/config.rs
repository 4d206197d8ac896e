//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub interpreter: InterpreterConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Measurement table configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,

    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
}

fn default_csv_path() -> String {
    "water_levels.csv".to_string()
}

fn default_timestamp_column() -> String {
    "Timestamp".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            timestamp_column: default_timestamp_column(),
        }
    }
}

/// Which intent source turns questions into intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterMode {
    /// Keyword and pattern rules
    #[default]
    Rules,
    /// Text-generation endpoint, falling back to rules on transport errors
    Generative,
}

impl FromStr for InterpreterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rules" | "rule" => Ok(Self::Rules),
            "generative" | "llm" => Ok(Self::Generative),
            other => Err(format!(
                "unknown interpreter '{}', expected 'rules' or 'generative'",
                other
            )),
        }
    }
}

/// Intent source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InterpreterConfig {
    #[serde(default)]
    pub mode: InterpreterMode,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_generator_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
}

fn default_endpoint() -> String {
    "http://localhost:8080/generate".to_string()
}

fn default_generator_timeout() -> u64 {
    5000 // 5 seconds
}

fn default_max_new_tokens() -> u32 {
    100
}

impl InterpreterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            mode: InterpreterMode::default(),
            endpoint: default_endpoint(),
            request_timeout_ms: default_generator_timeout(),
            max_new_tokens: default_max_new_tokens(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Default config locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("waterlevels").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/waterlevels/config.toml"));
        paths.push(PathBuf::from("./config.toml"));
        paths
    }

    /// The explicit path if given, otherwise the first default location that exists
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => first_existing(&Self::default_paths()),
        }
    }

    /// Load from default locations or environment
    ///
    /// A config file that exists but cannot be read or parsed is an error.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::resolve(None)
    }

    /// Load an explicit file if given, otherwise the default locations
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::locate(path) {
            Some(path) => Self::load_with_env(&path),
            None => Self::from_env(),
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Store overrides
        if let Some(path) = lookup("WATERLEVELS_DATA") {
            self.store.csv_path = path;
        }

        // Interpreter overrides
        if let Some(mode) = lookup("WATERLEVELS_INTERPRETER") {
            self.interpreter.mode = mode
                .parse()
                .map_err(|error| ConfigError::env("WATERLEVELS_INTERPRETER", error))?;
        }
        if let Some(url) = lookup("WATERLEVELS_GENERATOR_URL") {
            self.interpreter.endpoint = url;
        }

        // API overrides
        if let Some(host) = lookup("WATERLEVELS_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("WATERLEVELS_API_PORT") {
            self.api.port = port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::env("WATERLEVELS_API_PORT", format!("'{}': {}", port, e))
            })?;
        }

        // Logging overrides
        if let Some(level) = lookup("WATERLEVELS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("WATERLEVELS_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.exists()).cloned()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid {key}: {error}")]
    Env { key: String, error: String },
}

impl ConfigError {
    fn env(key: &str, error: impl Into<String>) -> Self {
        Self::Env {
            key: key.to_string(),
            error: error.into(),
        }
    }
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Water Levels Configuration
#
# Environment variables override these settings:
# - WATERLEVELS_DATA
# - WATERLEVELS_INTERPRETER
# - WATERLEVELS_GENERATOR_URL
# - WATERLEVELS_API_HOST
# - WATERLEVELS_API_PORT
# - WATERLEVELS_LOG_LEVEL
# - WATERLEVELS_LOG_FORMAT

[store]
# CSV file with a timestamp column and one Road_<n> column per road
csv_path = "water_levels.csv"

# Name of the timestamp column (auto-detected when absent)
timestamp_column = "Timestamp"

[interpreter]
# How questions become intents: rules or generative
mode = "rules"

# Text-generation endpoint used in generative mode
endpoint = "http://localhost:8080/generate"

# Generation request timeout (ms)
request_timeout_ms = 5000

# Token budget for each generation
max_new_tokens = 100

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins (empty allows any)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
