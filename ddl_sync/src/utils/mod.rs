//! Utilities for ddl_sync
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;
pub mod source;

// Re-export key utility functions
pub use logging::init_logging;
pub use naming::{format_name, get_foreign_key_name, quote_identifier, unquote_identifier};
pub use source::read_schema_source;
