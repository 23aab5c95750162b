// Check-in configuration
// Loaded once per client run from config.json; immutable afterwards

use crate::logging::LoggingConfig;
use crate::paths::Paths;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors that make a run impossible. All of these are fatal: the client
/// logs them and exits 1 without attempting any network traffic.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config.json found (searched {0:?})")]
    NotFound(Vec<PathBuf>),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckinConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub application: ApplicationConfig,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL; the client POSTs to `<url>/checkin`
    pub url: String,
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationConfig {
    /// Initial sleep before any work, letting the session settle after wake
    #[serde(default)]
    pub startup_delay_seconds: u64,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_max_retry_attempts() -> u32 {
    10
}

fn default_retry_delay_seconds() -> u64 {
    60
}

impl CheckinConfig {
    /// Load configuration from the first existing candidate location.
    pub fn load(paths: &Paths) -> Result<Self, ConfigError> {
        let candidates = paths.config_candidates();
        for candidate in &candidates {
            if candidate.exists() {
                return Self::load_from(candidate);
            }
        }
        Err(ConfigError::NotFound(candidates.to_vec()))
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.server.retry_delay_seconds)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.application.startup_delay_seconds)
    }
}
