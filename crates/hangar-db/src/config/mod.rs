//! Database configuration.
//!
//! This module provides the behavior switches of a [`Database`] and their
//! TOML representation.
//!
//! [`Database`]: crate::Database

use std::path::Path;

use anyhow::Result;
use hangar_sql::executor::{ExecOptions, UpdateChanges};
use serde::{Deserialize, Serialize};

/// What to do with statements the engine does not handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedPolicy {
    /// Return the neutral value (zero changes, no row, no rows).
    #[default]
    Degrade,
    /// Return [`DatabaseError::Unsupported`](crate::DatabaseError::Unsupported).
    Reject,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Handling of unsupported statement shapes.
    #[serde(default)]
    pub unsupported: UnsupportedPolicy,

    /// Change count reported by updates.
    #[serde(default)]
    pub update_changes: UpdateChanges,

    /// Reject inserts duplicating a value of a UNIQUE column.
    #[serde(default)]
    pub enforce_unique: bool,

    /// Log every statement at info level.
    #[serde(default)]
    pub statement_logging: bool,

    /// Statements slower than this are logged as warnings.
    #[serde(default = "default_slow_statement_threshold")]
    pub slow_statement_threshold_ms: u64,
}

fn default_slow_statement_threshold() -> u64 {
    100
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            unsupported: UnsupportedPolicy::default(),
            update_changes: UpdateChanges::default(),
            enforce_unique: false,
            statement_logging: false,
            slow_statement_threshold_ms: default_slow_statement_threshold(),
        }
    }
}

impl DatabaseConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects unsupported statements, reports true update counts and
    /// enforces UNIQUE columns.
    pub fn strict() -> Self {
        Self {
            unsupported: UnsupportedPolicy::Reject,
            update_changes: UpdateChanges::Matched,
            enforce_unique: true,
            ..Self::default()
        }
    }

    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the executor switches.
    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            update_changes: self.update_changes,
            enforce_unique: self.enforce_unique,
        }
    }

    /// Creates a builder for configuration.
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::new()
    }
}

/// Builder for database configuration.
#[derive(Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unsupported statement policy.
    pub fn unsupported(mut self, policy: UnsupportedPolicy) -> Self {
        self.config.unsupported = policy;
        self
    }

    /// Sets the update change count mode.
    pub fn update_changes(mut self, mode: UpdateChanges) -> Self {
        self.config.update_changes = mode;
        self
    }

    /// Enables UNIQUE enforcement.
    pub fn enforce_unique(mut self, enabled: bool) -> Self {
        self.config.enforce_unique = enabled;
        self
    }

    /// Enables statement logging.
    pub fn statement_logging(mut self, enabled: bool) -> Self {
        self.config.statement_logging = enabled;
        self
    }

    /// Sets the slow statement threshold in milliseconds.
    pub fn slow_statement_threshold_ms(mut self, ms: u64) -> Self {
        self.config.slow_statement_threshold_ms = ms;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> DatabaseConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.unsupported, UnsupportedPolicy::Degrade);
        assert_eq!(config.update_changes, UpdateChanges::LegacyAlwaysOne);
        assert!(!config.enforce_unique);
        assert_eq!(config.slow_statement_threshold_ms, 100);
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::builder()
            .unsupported(UnsupportedPolicy::Reject)
            .enforce_unique(true)
            .slow_statement_threshold_ms(5)
            .build();

        assert_eq!(config.unsupported, UnsupportedPolicy::Reject);
        assert!(config.enforce_unique);
        assert_eq!(config.slow_statement_threshold_ms, 5);
        assert!(config.exec_options().enforce_unique);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DatabaseConfig = toml::from_str("update_changes = \"matched\"").unwrap();
        assert_eq!(config.update_changes, UpdateChanges::Matched);
        assert_eq!(config.unsupported, UnsupportedPolicy::Degrade);
        assert_eq!(config.slow_statement_threshold_ms, 100);
    }

    #[test]
    fn test_to_toml() {
        let toml = DatabaseConfig::strict().to_toml().unwrap();
        assert!(toml.contains("unsupported = \"reject\""));
        assert!(toml.contains("update_changes = \"matched\""));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("hangar.toml");

        let config = DatabaseConfig::builder()
            .statement_logging(true)
            .update_changes(UpdateChanges::Matched)
            .build();
        config.save(&path).unwrap();

        let loaded = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
