//! Configuration file support for Luna.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/luna/config.toml`.

use crate::{CycleSettings, Error, Result, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Which user's journal to open
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user: default_user(),
        }
    }
}

/// Fallback cycle parameters for users whose settings carry none
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_cycle_length")]
    pub average_cycle_length: u32,

    #[serde(default = "default_period_length")]
    pub average_period_length: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            average_cycle_length: default_cycle_length(),
            average_period_length: default_period_length(),
        }
    }
}

impl DefaultsConfig {
    /// Fill missing or zero lengths in `settings` from these defaults
    pub fn apply(&self, settings: &CycleSettings) -> CycleSettings {
        CycleSettings {
            average_cycle_length: Some(settings.cycle_length_or(self.average_cycle_length)),
            average_period_length: Some(settings.period_length_or(self.average_period_length)),
            ..settings.clone()
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("luna")
}

fn default_user() -> String {
    "default".into()
}

fn default_cycle_length() -> u32 {
    DEFAULT_CYCLE_LENGTH
}

fn default_period_length() -> u32 {
    DEFAULT_PERIOD_LENGTH
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("luna").join("config.toml")
    }

    /// Reject values the rest of the system cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.defaults.average_cycle_length == 0 {
            return Err(Error::Config("average_cycle_length must be positive".into()));
        }
        if self.defaults.average_period_length == 0 {
            return Err(Error::Config("average_period_length must be positive".into()));
        }
        if self.data.user.trim().is_empty()
            || self.data.user.contains(['/', '\\'])
            || self.data.user.starts_with('.')
        {
            return Err(Error::Config(format!(
                "Invalid user name {:?}",
                self.data.user
            )));
        }
        Ok(())
    }

    /// Directory holding one user's journal and settings
    pub fn user_dir(&self) -> PathBuf {
        self.data.data_dir.join(&self.data.user)
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
