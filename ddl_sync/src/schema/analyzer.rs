//! Table locator
//!
//! Finds `CREATE TABLE` statements in schema text and extracts the full
//! statement for a named table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::schema::scanner::require_delimiter;

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)CREATE(?:\s*TEMPORARY)?\s*TABLE\s*(?:IF\s+NOT\s+EXISTS\s*)?(?:`?\w+`?\.)?`?(\w+)`?",
    )
    .unwrap()
});

/// List the names of all created tables, in order of appearance
///
/// Duplicates are kept; schema qualifiers are not part of the name.
pub fn find_table_names(sql: &str) -> Vec<String> {
    TABLE_NAME
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extract the `CREATE TABLE` statement of `name`, without its trailing `;`
///
/// When several statements create the same table the last one wins. With
/// `strip_schema_qualifier`, `` `db`.`name` `` is rewritten to `` `name` ``.
/// Returns `Ok(None)` when no statement creates the table, and a syntax error
/// when the matching statement is not terminated by `;`.
pub fn extract_table_statement(
    name: &str,
    sql: &str,
    strip_schema_qualifier: bool,
) -> Result<Option<String>> {
    let pattern = format!(
        r"((?i:CREATE(?:\s*TEMPORARY)?\s*TABLE\s*(?:IF\s+NOT\s+EXISTS\s*)?)\s*)(?:`?(\w+)`?\.)?`?({})`?(\W|$)",
        regex::escape(name)
    );
    let table_re = Regex::new(&pattern)
        .map_err(|e| Error::Unknown(format!("Invalid table pattern for `{}`: {}", name, e)))?;

    let caps = match table_re.captures_iter(sql).last() {
        Some(caps) => caps,
        None => return Ok(None),
    };
    let Some(whole) = caps.get(0) else {
        return Ok(None);
    };

    let end = require_delimiter(sql, whole.end(), ';', false)?;
    let rest = &sql[whole.end()..end];

    let statement = match caps.get(2) {
        Some(_) if strip_schema_qualifier => {
            let keyword = &caps[1];
            let trailing = caps
                .get(4)
                .map(|m| m.as_str())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("");
            format!("{}`{}` {}{}", keyword, &caps[3], trailing, rest)
        }
        _ => sql[whole.start()..end].to_string(),
    };

    Ok(Some(statement.trim().to_string()))
}
