use std::path::{Path, PathBuf};

use mllp::{ListenerConfig, SenderConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, SchemaConfig};
use crate::extract::BatchSplitter;
use crate::schema::{is_supported, SUPPORTED_VERSIONS};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("Unsupported default HL7 version '{0}'")]
    UnsupportedVersion(String),

    #[error("Invalid batch settings: {0}")]
    InvalidBatch(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error("Invalid [{section}] settings: {reason}")]
    Transport { section: &'static str, reason: String },
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    /// Remote host for `send`; optional so the text tools work without one
    pub sender: Option<SenderConfig>,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub batch: BatchSplitter,
}

impl Config {
    /// Read, parse and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        if !is_supported(&self.schema.default_version) {
            return Err(ConfigError::UnsupportedVersion(format!(
                "{} (supported: {})",
                self.schema.default_version,
                SUPPORTED_VERSIONS.join(", ")
            )));
        }

        if self.batch.header_token.trim().is_empty() {
            return Err(ConfigError::InvalidBatch("header_token cannot be empty".into()));
        }

        if let Some(sender) = &self.sender {
            sender.validate().map_err(|e| ConfigError::Transport {
                section: "sender",
                reason: e.to_string(),
            })?;
        }

        self.listener.validate().map_err(|e| ConfigError::Transport {
            section: "listener",
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
