//! Configuration handling for ddl_sync

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};
use crate::schema::types::ActionSet;

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete ddl_sync configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    pub logging: Option<LoggingConfig>,
}

/// Options for one schema comparison
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Rewrite `db.table` to `table` in extracted statements
    pub strip_schema_qualifier: bool,
    /// Drop `AUTO_INCREMENT=<n>` table options before comparing
    pub ignore_auto_increment: bool,
    /// Remove `IF NOT EXISTS` from CREATE statements taken over verbatim
    pub strip_if_not_exists_from_source: bool,
    /// Emit every CREATE TABLE as `CREATE TABLE IF NOT EXISTS`
    pub force_if_not_exists_on_create: bool,
    /// Categories of generated statements let through the filter
    pub allowed_actions: ActionSet,
    /// Render the result as one `;\n`-joined script instead of a list
    pub output_as_joined_string: bool,
    /// Name pattern for synthesized foreign-key indexes and constraints
    pub foreign_key_pattern: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strip_schema_qualifier: true,
            ignore_auto_increment: true,
            strip_if_not_exists_from_source: true,
            force_if_not_exists_on_create: true,
            allowed_actions: ActionSet::all(),
            output_as_joined_string: true,
            foreign_key_pattern: "fk_{table}_{column}".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Log to the console (stderr) when no file is set
    #[serde(default = "default_true", alias = "stdout")]
    pub console: bool,
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}
