//! Configuration management for harscope.
//!
//! Handles:
//! - Where session descriptors live and how long they are kept
//! - Response sizing (preview threshold, list limit, snippet length)
//! - Analysis thresholds

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarError, Result};
use crate::util::atomic_write;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Session storage settings.
    #[serde(default)]
    pub sessions: SessionConfig,
    /// Output sizing.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Analysis thresholds.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| HarError::InvalidConfig {
            message: format!("{}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make output unusable.
    pub fn validate(&self) -> Result<()> {
        if self.display.preview_length == 0 {
            return Err(HarError::InvalidConfig {
                message: "display.preview_length must be greater than 0".to_string(),
            });
        }
        if self.display.preview_length > self.display.preview_threshold {
            return Err(HarError::InvalidConfig {
                message: format!(
                    "display.preview_length ({}) must not exceed display.preview_threshold ({})",
                    self.display.preview_length, self.display.preview_threshold
                ),
            });
        }
        if self.display.default_limit == 0 {
            return Err(HarError::InvalidConfig {
                message: "display.default_limit must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to a specific path.
    ///
    /// Uses atomic file writes to ensure configuration integrity.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| HarError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        atomic_write(path, content.as_bytes())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HarError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })
    }
}

/// Session storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding session descriptors.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Descriptor lifetime in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Largest capture accepted, in bytes (0 = unlimited).
    #[serde(default)]
    pub max_file_size: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            directory: None,
            ttl_seconds: default_ttl(),
            max_file_size: 0,
        }
    }
}

/// Display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Content at or above this many characters is previewed behind a ref.
    #[serde(default = "default_preview_threshold")]
    pub preview_threshold: usize,
    /// Characters shown in a preview.
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    /// Entries listed when no limit is given.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Characters of body shown in analysis snippets.
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,
    /// Width of the path column in entry lines.
    #[serde(default = "default_path_width")]
    pub path_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_threshold: default_preview_threshold(),
            preview_length: default_preview_length(),
            default_limit: default_limit(),
            snippet_length: default_snippet_length(),
            path_width: default_path_width(),
        }
    }
}

/// Analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Entries at or above this time are reported as slow.
    #[serde(default = "default_slow_threshold")]
    pub slow_threshold_ms: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            slow_threshold_ms: default_slow_threshold(),
        }
    }
}

// Default value functions for serde
fn default_ttl() -> u64 {
    24 * 60 * 60
}

fn default_preview_threshold() -> usize {
    2000
}

fn default_preview_length() -> usize {
    500
}

fn default_limit() -> usize {
    50
}

fn default_snippet_length() -> usize {
    120
}

fn default_path_width() -> usize {
    80
}

fn default_slow_threshold() -> f64 {
    1000.0
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| HarError::Unsupported {
        feature: "config directory discovery".to_string(),
    })?;

    Ok(config_dir.join("harscope").join("config.toml"))
}

/// Get the default sessions directory.
pub fn default_sessions_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| HarError::Unsupported {
        feature: "cache directory discovery".to_string(),
    })?;

    Ok(cache_dir.join("harscope").join("sessions"))
}
