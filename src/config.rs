//! Client configuration
//!
//! Stored as JSON in `~/.config/mfs-explorer/config.json`, overridable
//! through environment variables.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Kubo RPC endpoint
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001";

/// Default number of per-entry calls a batch runs at once
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Connection settings for the node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the RPC API (without `/api/v0`)
    pub api_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Upper bound on concurrent calls within one batch
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_timeout() -> u64 {
    60
}

fn default_max_parallel() -> usize {
    DEFAULT_MAX_PARALLEL
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: default_timeout(),
            max_parallel: default_max_parallel(),
        }
    }
}

impl ClientConfig {
    /// Config pointing at a specific endpoint with default limits
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        ClientConfig {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Default config file location (~/.config/mfs-explorer/config.json)
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(dir.join("mfs-explorer").join("config.json"))
    }

    /// Load config from a file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the environment
    /// Recognized: IPFS_API_URL, IPFS_TIMEOUT_SECS, IPFS_MAX_PARALLEL
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = var("IPFS_API_URL") {
            self.api_url = url;
        }
        if let Some(secs) = var("IPFS_TIMEOUT_SECS") {
            self.timeout_secs = secs.parse().map_err(|_| {
                Error::Config(format!("IPFS_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(n) = var("IPFS_MAX_PARALLEL") {
            self.max_parallel = n
                .parse()
                .map_err(|_| Error::Config(format!("IPFS_MAX_PARALLEL is not a number: {}", n)))?;
        }
        self.validate()
    }

    /// Load from `path` (or the default location) and apply env overrides
    /// Priority: env vars > config file > defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        Self::load(&path)?.apply_env()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel == 0 {
            return Err(Error::Config("max_parallel must be at least 1".into()));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api_url must be an http(s) URL: {}",
                self.api_url
            )));
        }
        Ok(())
    }
}
