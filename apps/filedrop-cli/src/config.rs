//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/filedrop/filedrop.toml`
//! - Windows: `%APPDATA%/filedrop/filedrop.toml`

use std::path::{Path, PathBuf};

use filedrop_queue::QueueConfig;
use filedrop_transfer::SimulationConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration: queue tuning at the root, the simulated
/// backend under `[simulation]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiledropConfig {
    #[serde(flatten)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl FiledropConfig {
    /// Loads configuration from `path`, or from the platform default
    /// location. A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path(),
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: FiledropConfig = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = FiledropConfig::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("filedrop").join("filedrop.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("filedrop")
            .join("filedrop.toml")
    }
}
