//! Configuration types for Sigil.
//!
//! A single YAML file (`sigil.yaml`) carries both sides of a deployment:
//!
//! - **authority**: the central token authority (bind address, issuer, key directory)
//! - **peer**: one participant service (identity, peers, trusted callers)
//!
//! Every field has a default, so an empty or absent file is valid.
//! Command-line flags and environment variables override file values.

pub mod authority;
pub mod peer;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use authority::AuthorityConfig;
pub use peer::PeerConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SIGIL_CONFIG";

/// Configuration file looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "sigil.yaml";

/// Complete Sigil configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigilConfig {
    /// Token authority settings.
    #[serde(default)]
    pub authority: AuthorityConfig,

    /// Participant service settings.
    #[serde(default)]
    pub peer: PeerConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SigilConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from the first source that applies:
    ///
    /// 1. `explicit` (must exist)
    /// 2. the file named by `SIGIL_CONFIG` (must exist)
    /// 3. `sigil.yaml` in the working directory, if present
    /// 4. built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            tracing::info!(path = %path.display(), "Loading configuration");
            return Self::from_file(path);
        }

        if let Ok(p) = env::var(CONFIG_ENV) {
            let path = PathBuf::from(p);
            tracing::info!(path = %path.display(), "Loading configuration from {}", CONFIG_ENV);
            return Self::from_file(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            tracing::info!(path = %fallback.display(), "Loading configuration");
            return Self::from_file(fallback);
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }
}
