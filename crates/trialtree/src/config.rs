//! Configuration for trialtree sessions and the CLI

use crate::error::{Result, TrialTreeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialTreeConfig {
    /// Local directory used as the object store
    #[serde(default = "default_store_root")]
    pub store_root: String,

    /// Maximum listings fetched at once when resolving scheduled fetches
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Tracing filter overriding the built-in default (RUST_LOG still wins)
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_store_root() -> String {
    trialtree_home()
        .join("store")
        .to_string_lossy()
        .to_string()
}

fn default_fetch_concurrency() -> usize {
    8
}

impl Default for TrialTreeConfig {
    fn default() -> Self {
        Self {
            store_root: default_store_root(),
            fetch_concurrency: default_fetch_concurrency(),
            log_filter: None,
        }
    }
}

/// Trialtree home directory: `$TRIALTREE_HOME` or `~/.trialtree`
pub fn trialtree_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("TRIALTREE_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".trialtree")
}

/// Default config file location: `~/.trialtree/config.toml`
pub fn default_config_path() -> PathBuf {
    trialtree_home().join("config.toml")
}

impl TrialTreeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TrialTreeConfig =
            toml::from_str(&content).map_err(|e| TrialTreeError::Config(e.to_string()))?;
        if config.fetch_concurrency == 0 {
            return Err(TrialTreeError::Config(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| TrialTreeError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
