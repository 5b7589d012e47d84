//! Uploader configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/cloudvault/uploader.toml`
//! - Windows: `%APPDATA%/cloudvault/uploader.toml`

use std::path::{Path, PathBuf};

use anyhow::Context;
use cloudvault_transfer::SimulationConfig;
use serde::{Deserialize, Serialize};

/// Uploader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minimum delay between two printed lines for the same transfer.
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,

    /// Progress bar width in characters.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// Transfer simulation settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_render_interval_ms() -> u64 {
    500
}

fn default_bar_width() -> usize {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render_interval_ms: default_render_interval_ms(),
            bar_width: default_bar_width(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the platform default location.
    ///
    /// An explicit path must exist. A missing default file is created with
    /// default values.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path(), false),
        };

        if !path.exists() {
            if explicit {
                anyhow::bail!("config file not found: {}", path.display());
            }
            let config = Config::default();
            if let Err(e) = config.save(&path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to write default config");
            }
            return Ok(config);
        }

        let config = Self::load_from(&path)?;
        config
            .simulation
            .validate()
            .with_context(|| format!("invalid simulation settings in {}", path.display()))?;
        Ok(config)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
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
        PathBuf::from(appdata).join("cloudvault").join("uploader.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("cloudvault")
            .join("uploader.toml")
    }
}
