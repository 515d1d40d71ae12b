//! CLI configuration file support
//!
//! Loads configuration from ~/.config/genstudio/config.toml

use anyhow::Result;
use genstudio_core::{Credential, RequesterConfig, paths};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// HTTP and redaction settings for the requester
    #[serde(default)]
    pub http: RequesterConfig,
    /// Credential settings
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Credential configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Shared tokens seeded into the session cache
    #[serde(default)]
    pub shared_tokens: Vec<String>,
    /// Endpoint serving the shared token pool
    pub shared_pool_url: Option<String>,
    /// Profile file override (defaults to ~/.genstudio/profile.json)
    pub profile_path: Option<PathBuf>,
}

impl CredentialsConfig {
    pub fn seeded_shared(&self) -> Vec<Credential> {
        self.shared_tokens
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(Credential::shared)
            .collect()
    }
}

impl CliConfig {
    /// Load configuration from `path`, or the default path when `None`
    pub fn load(path: Option<PathBuf>) -> Self {
        Self::load_from_path(path.or_else(Self::default_path))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "Invalid config, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("genstudio").join("config.toml"))
    }

    /// Resolve the personal profile path
    pub fn profile_path(&self) -> Result<PathBuf> {
        match &self.credentials.profile_path {
            Some(path) => Ok(path.clone()),
            None => Ok(paths::profile_path()?),
        }
    }
}
