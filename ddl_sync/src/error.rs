//! Error types for ddl_sync

use thiserror::Error;

/// Result type for ddl_sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ddl_sync
#[derive(Error, Debug)]
pub enum Error {
    #[error("Syntax error: invalid SQL, cannot find delimiter ('{delimiter}')")]
    SyntaxError { delimiter: char },

    #[error("Table not found: cannot extract CREATE TABLE statement for `{0}`")]
    TableNotFound(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Convert Serde JSON errors to ddl_sync errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to ddl_sync errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
