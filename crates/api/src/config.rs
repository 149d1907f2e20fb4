//! Server configuration
//!
//! Built in three layers: defaults, an optional TOML file, then
//! `WINE_API_*` environment variables. Command-line flags are applied on
//! top by the binary.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wine_forest::DEFAULT_ARTIFACT_PATH;

pub const ENV_HOST: &str = "WINE_API_HOST";
pub const ENV_PORT: &str = "WINE_API_PORT";
pub const ENV_MODEL_PATH: &str = "WINE_API_MODEL_PATH";
pub const ENV_REQUIRE_MODEL: &str = "WINE_API_REQUIRE_MODEL";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("model artifact {0} not found")]
    ModelMissing(PathBuf),
}

/// Runtime settings for the prediction service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    /// Refuse to start when the artifact file is missing
    pub require_model: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            require_model: true,
        }
    }
}

impl ServerConfig {
    /// Defaults, overlaid with `path` (if given) and then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from TOML file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value source shaped like the environment
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }

        if let Some(value) = lookup(ENV_PORT) {
            self.port = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_PORT,
                value: value.clone(),
            })?;
        }

        if let Some(path) = lookup(ENV_MODEL_PATH) {
            self.model_path = PathBuf::from(path);
        }

        if let Some(value) = lookup(ENV_REQUIRE_MODEL) {
            self.require_model = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                key: ENV_REQUIRE_MODEL,
                value,
            })?;
        }

        Ok(())
    }

    /// Fail when the artifact is required but absent
    ///
    /// Only checks presence; a file that exists but does not load is
    /// reported through the health endpoint instead.
    pub fn check_model_present(&self) -> Result<(), ConfigError> {
        if self.require_model && !self.model_path.exists() {
            return Err(ConfigError::ModelMissing(self.model_path.clone()));
        }
        Ok(())
    }

    /// `host:port` string handed to the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
