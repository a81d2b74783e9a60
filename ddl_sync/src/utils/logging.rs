//! Logging utilities for ddl_sync
//!
//! This module provides logging setup and configuration.

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Parse a level name, falling back to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging based on configuration
///
/// `level_override` replaces the configured level and also enables stderr
/// logging when no configuration is given.
pub fn init_logging(config: &Option<LoggingConfig>, level_override: Option<Level>) -> Result<()> {
    let config = match (config, level_override) {
        (Some(cfg), _) => cfg.clone(),
        (None, Some(level)) => LoggingConfig {
            level: level.to_string(),
            file: None,
            format: "text".to_string(),
            console: true,
        },
        (None, None) => return Ok(()),
    };

    let level = level_override.unwrap_or_else(|| parse_level(&config.level));
    let directive = format!("ddl_sync={}", level)
        .parse()
        .map_err(|e| Error::Unknown(format!("Invalid log directive: {}", e)))?;
    let env_filter = EnvFilter::from_default_env().add_directive(directive);
    let json = config.format.eq_ignore_ascii_case("json");

    // Statements go to stdout, so console logging is written to stderr
    let result = if let Some(file_path) = &config.file {
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(file_path)?;

        if json {
            let subscriber = fmt::Subscriber::builder()
                .json()
                .with_env_filter(env_filter)
                .with_writer(file)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        } else {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    } else if config.console {
        if json {
            let subscriber = fmt::Subscriber::builder()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        } else {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    } else {
        return Ok(());
    };

    result.map_err(|e| Error::Unknown(e.to_string()))
}
