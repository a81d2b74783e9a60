//! Naming utilities for ddl_sync
//!
//! Identifier quoting and the name patterns used for synthesized keys.

/// Format a name according to a pattern with placeholders
pub fn format_name(pattern: &str, replacements: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();

    for (placeholder, value) in replacements {
        result = result.replace(&format!("{{{}}}", placeholder), value);
    }

    result
}

/// Get foreign key constraint name according to pattern
pub fn get_foreign_key_name(pattern: &str, table_name: &str, column_name: &str) -> String {
    format_name(pattern, &[("table", table_name), ("column", column_name)])
}

/// Strip surrounding back-quotes from an identifier
pub fn unquote_identifier(ident: &str) -> &str {
    let trimmed = ident.trim();
    trimmed
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .unwrap_or(trimmed)
}

/// Wrap an identifier in back-quotes, unless it already is
pub fn quote_identifier(ident: &str) -> String {
    format!("`{}`", unquote_identifier(ident))
}

/// The first whitespace-delimited word of a declaration
pub fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}
