//! Schema module for ddl_sync
//!
//! This module handles locating, splitting and comparing `CREATE TABLE`
//! statements and compiling the differences into migration SQL.

pub mod analyzer;
pub mod diff;
pub mod generator;
pub mod keys;
pub mod normalize;
pub mod scanner;
pub mod splitter;
pub mod types;

// Re-export key types
pub use analyzer::{extract_table_statement, find_table_names};
pub use diff::SchemaDiff;
pub use generator::{compile_statement, generate_migration_sql, render_script};
pub use keys::{KeyDeclaration, Priority, SortKey};
pub use splitter::{split_table_schema, TableBody};
pub use types::{ActionKind, ActionSet, Bucket, DeclarationDiff, TableComparison};
