//! ddl_sync: compare two MySQL schema dumps and generate the migration between them
//!
//! Both inputs are plain text holding `CREATE TABLE` statements. The result is
//! the ordered `ALTER TABLE` / `CREATE TABLE` / `DROP TABLE` statements that
//! turn the source schema into the destination schema.

pub mod config;
pub mod error;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::{Config, SyncConfig};
pub use error::{Error, Result};
pub use schema::diff::SchemaDiff;
pub use schema::generator::render_script;
pub use schema::types::{ActionKind, ActionSet};

use schema::generator::generate_migration_sql;
use schema::scanner::strip_comments;

/// Result of a comparison, shaped by `output_as_joined_string`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutput {
    /// All statements joined by `;\n` with a trailing `;`
    Script(String),
    /// The statements in emission order, without terminators
    Statements(Vec<String>),
}

impl SyncOutput {
    /// Render as a script regardless of the chosen shape
    pub fn into_script(self) -> String {
        match self {
            SyncOutput::Script(script) => script,
            SyncOutput::Statements(statements) => render_script(&statements),
        }
    }
}

/// Compare two raw schema texts and return the filtered diff
pub fn compare(source: &str, destination: &str, config: &SyncConfig) -> Result<SchemaDiff> {
    let source = strip_comments(source);
    let destination = strip_comments(destination);

    let diff = SchemaDiff::generate(&source, &destination, config)?;
    Ok(diff.filter(&config.allowed_actions))
}

/// Generate the ordered migration statements from `source` to `destination`
pub fn sync_statements(
    source: &str,
    destination: &str,
    config: &SyncConfig,
) -> Result<Vec<String>> {
    let diff = compare(source, destination, config)?;

    if diff.is_empty() {
        tracing::debug!("Schemas are already in sync");
        return Ok(Vec::new());
    }

    let statements = generate_migration_sql(&diff);
    tracing::debug!(
        tables = diff.changed_tables(),
        statements = statements.len(),
        "Generated migration"
    );

    Ok(statements)
}

/// Generate the migration in the shape selected by the configuration
pub fn sync(source: &str, destination: &str, config: &SyncConfig) -> Result<SyncOutput> {
    let statements = sync_statements(source, destination, config)?;

    if config.output_as_joined_string {
        Ok(SyncOutput::Script(render_script(&statements)))
    } else {
        Ok(SyncOutput::Statements(statements))
    }
}
