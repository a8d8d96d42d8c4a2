//! Client configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via BYOND_TOPIC_CONFIG or --config)
//! 3. Environment variables

use crate::address::ServerAddress;
use crate::read::ReadStrategy;
use crate::session::{
    SessionConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_RESPONSE_CAPACITY,
    MAX_RESPONSE_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "BYOND_TOPIC_CONFIG";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server used when none is given on the command line.
    pub server: Option<ServerAddress>,
    /// Read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// How the end of a reply is detected.
    pub read_strategy: ReadStrategy,
    /// Upper bound in bytes for a timeout-driven read.
    pub response_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: None,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            read_strategy: ReadStrategy::default(),
            response_capacity: DEFAULT_RESPONSE_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let config = Self::load_layered(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads defaults, then `path` if given, then environment overrides.
    ///
    /// Does not validate; callers layering further overrides on top call
    /// [`validate`](Self::validate) themselves.
    pub fn load_layered(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::layered(path, |key| std::env::var(key).ok())
    }

    fn layered<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: ClientConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applies environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup("BYOND_TOPIC_SERVER") {
            match server.parse() {
                Ok(parsed) => self.server = Some(parsed),
                Err(e) => tracing::warn!("Ignoring BYOND_TOPIC_SERVER: {}", e),
            }
        }

        if let Some(timeout) = lookup("BYOND_TOPIC_READ_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.read_timeout_ms = ms;
            }
        }

        if let Some(timeout) = lookup("BYOND_TOPIC_CONNECT_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.connect_timeout_ms = ms;
            }
        }

        if let Some(strategy) = lookup("BYOND_TOPIC_READ_STRATEGY") {
            match strategy.parse() {
                Ok(parsed) => self.read_strategy = parsed,
                Err(e) => tracing::warn!("Ignoring BYOND_TOPIC_READ_STRATEGY: {}", e),
            }
        }

        if let Some(capacity) = lookup("BYOND_TOPIC_RESPONSE_CAPACITY") {
            if let Ok(n) = capacity.parse() {
                self.response_capacity = n;
            }
        }
    }

    /// Checks values that would make every call fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response_capacity == 0 {
            return Err(ConfigError::Validation(
                "response_capacity must be greater than zero".to_string(),
            ));
        }
        if self.response_capacity > MAX_RESPONSE_CAPACITY {
            return Err(ConfigError::Validation(format!(
                "response_capacity must be at most {} bytes",
                MAX_RESPONSE_CAPACITY
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "connect_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(())
    }

    /// Returns read timeout as Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Returns connect timeout as Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Builds the session configuration for a regular call.
    ///
    /// A zero read timeout falls back to the default one.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new()
            .with_read_timeout(self.read_timeout())
            .with_read_strategy(self.read_strategy)
            .with_response_capacity(self.response_capacity)
            .with_connect_timeout(self.connect_timeout())
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file '{}': {}", .0.display(), .1)]
    Parse(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
