//! Configuration loaded from `~/.config/reel/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    /// Fixed user agent instead of a random browser profile.
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// Settings for the FlixHQ-layout provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlixHqConfig {
    pub base_url: String,
}

impl Default for FlixHqConfig {
    fn default() -> Self {
        Self {
            base_url: "https://flixhq.to".to_string(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub http: HttpConfig,
    pub flixhq: FlixHqConfig,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            http: HttpConfig::default(),
            flixhq: FlixHqConfig::default(),
        }
    }
}

impl ReelConfig {
    /// Load from the default location.
    ///
    /// Returns defaults if the file doesn't exist (configuration is optional).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reel")
        .join("config.toml")
}
