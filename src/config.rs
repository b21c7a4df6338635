//! User configuration for cardling
//!
//! Stored as JSON at `$XDG_CONFIG_HOME/cardling/config.json`. Every field has a
//! default, so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cardling_core::{Brush, Size, TextStyle};
use cardling_history::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where share links point when no base URL is configured
pub const DEFAULT_SHARE_BASE_URL: &str = "https://cardling.app";

/// Postcard canvas size
pub const DEFAULT_CANVAS: Size = Size {
    width: 600.0,
    height: 400.0,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entries kept on each of the undo and redo stacks
    pub history_limit: usize,
    pub canvas: Size,
    pub share_base_url: String,
    /// Style for newly added text
    pub text: TextStyle,
    pub brush: Brush,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            canvas: DEFAULT_CANVAS,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            text: TextStyle::default(),
            brush: Brush::default(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            });
        config_dir.join("cardling").join("config.json")
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("parse config: {}", path.display()))?;
        debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }
}
