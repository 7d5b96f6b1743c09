//! Configuration file support for the CLI.
//!
//! Loads and saves shell settings and the embedded database's settings from
//! TOML files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hangar_db::DatabaseConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default output format.
    #[serde(default = "default_format")]
    pub output_format: String,

    /// Enable timing by default.
    #[serde(default)]
    pub timing: bool,

    /// Create the booking platform relations at startup.
    #[serde(default)]
    pub bootstrap: bool,

    /// History file path.
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Maximum history size.
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Settings of the embedded database.
    #[serde(default)]
    pub database: DatabaseConfig,
}

fn default_format() -> String {
    "table".to_string()
}

fn default_history_size() -> usize {
    1000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output_format: default_format(),
            timing: false,
            bootstrap: false,
            history_file: None,
            history_size: default_history_size(),
            database: DatabaseConfig::default(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loads the default configuration file.
    ///
    /// Looks in the following locations:
    /// 1. ~/.config/hangar/config.toml
    /// 2. ~/.hangar/config.toml
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".hangar").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Returns the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("hangar").join("config.toml"))
    }

    /// Returns the history file, configured or under the local data dir.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("hangar").join("history")))
    }

    /// Returns a builder for configuration.
    #[cfg(test)]
    pub fn builder() -> CliConfigBuilder {
        CliConfigBuilder::default()
    }
}

/// Builder for CLI configuration, used by tests to stage config files.
#[cfg(test)]
#[derive(Default)]
pub struct CliConfigBuilder {
    config: CliConfig,
}

#[cfg(test)]
impl CliConfigBuilder {
    /// Sets the output format.
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.config.output_format = format.into();
        self
    }

    /// Enables timing.
    pub fn timing(mut self, enabled: bool) -> Self {
        self.config.timing = enabled;
        self
    }

    /// Creates the platform schema at startup.
    pub fn bootstrap(mut self, enabled: bool) -> Self {
        self.config.bootstrap = enabled;
        self
    }

    /// Sets the history file.
    pub fn history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.history_file = Some(path.into());
        self
    }

    /// Sets the database settings.
    pub fn database(mut self, database: DatabaseConfig) -> Self {
        self.config.database = database;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CliConfig {
        self.config
    }
}
