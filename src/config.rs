use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub render: RenderConfig,
}

/// Data directory and source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
    /// Source abbreviation used when a lookup doesn't name one (e.g. "MM").
    pub default_source: Option<String>,
}

/// Rendering defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Proficiency bonus substituted for `PB` tokens when the CLI
    /// doesn't pass one explicitly.
    pub proficiency_bonus: Option<i64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_source: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            proficiency_bonus: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/bestiarium/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data
            .data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("bestiarium")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("bestiarium").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
