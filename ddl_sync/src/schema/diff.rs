//! Schema difference calculator
//!
//! This module compares two schema texts table by table and calculates the
//! declaration-level differences between them.

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::schema::analyzer::{extract_table_statement, find_table_names};
use crate::schema::keys::{build_declaration_map, column_names, DeclarationMap, KeyDeclaration};
use crate::schema::normalize::normalize_expression;
use crate::schema::splitter::split_table_schema;
use crate::schema::types::{ActionKind, ActionSet, DeclarationDiff, TableComparison};
use crate::utils::naming::quote_identifier;

static FOREIGN_KEY_CONSTRAINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^CONSTRAINT\s+(`?\w+`?)\s+FOREIGN\s+KEY\s*(\([^)]+\))").unwrap()
});

static AUTO_INCREMENT_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*AUTO_INCREMENT\s*=\s*[0-9]+").unwrap());

static IF_NOT_EXISTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)IF\s+NOT\s+EXISTS\s*").unwrap());

static CREATE_TABLE_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(CREATE(?:\s*TEMPORARY)?\s*TABLE\s*)(?:IF\s+NOT\s+EXISTS\s*)?(`?\w+`?)")
        .unwrap()
});

/// Differences between two schemas, per table name
///
/// Tables appear in source order, followed by destination-only tables in
/// destination order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaDiff {
    pub tables: IndexMap<String, TableComparison>,
}

impl SchemaDiff {
    /// Compare two comment-free schema texts
    pub fn generate(source: &str, destination: &str, config: &SyncConfig) -> Result<Self> {
        let source_names: IndexSet<String> = find_table_names(source).into_iter().collect();
        let destination_names: IndexSet<String> =
            find_table_names(destination).into_iter().collect();

        let all_names: IndexSet<&String> =
            source_names.iter().chain(destination_names.iter()).collect();
        let mut tables = IndexMap::new();

        for name in all_names {
            let comparison = match (
                source_names.contains(name),
                destination_names.contains(name),
            ) {
                (true, false) => TableComparison::SourceOnly,
                (false, _) => TableComparison::DestinationOnly {
                    create_statement: create_table_sql(name, destination, config)?,
                },
                (true, true) => {
                    let source_sql = extract_existing(name, source, config)?;
                    let destination_sql = extract_existing(name, destination, config)?;
                    let diffs = compare_table_sql(name, &source_sql, &destination_sql, config)?;
                    if diffs.is_empty() {
                        TableComparison::Unchanged
                    } else {
                        TableComparison::Changed { diffs }
                    }
                }
            };

            tracing::debug!(
                table = %name,
                comparison = comparison_label(&comparison),
                "Compared table"
            );
            tables.insert(name.clone(), comparison);
        }

        Ok(Self { tables })
    }

    /// Keep only the changes whose action is allowed
    ///
    /// Unchanged tables and tables left without any diff are removed.
    pub fn filter(self, allowed: &ActionSet) -> Self {
        let tables = self
            .tables
            .into_iter()
            .filter_map(|(name, comparison)| {
                let kept = match comparison {
                    TableComparison::SourceOnly if allowed.contains(ActionKind::Drop) => {
                        Some(TableComparison::SourceOnly)
                    }
                    TableComparison::DestinationOnly { create_statement }
                        if allowed.contains(ActionKind::Create) =>
                    {
                        Some(TableComparison::DestinationOnly { create_statement })
                    }
                    TableComparison::Changed { diffs } => {
                        let diffs: Vec<DeclarationDiff> = diffs
                            .into_iter()
                            .filter(|diff| allowed.contains(diff.action()))
                            .collect();
                        (!diffs.is_empty()).then_some(TableComparison::Changed { diffs })
                    }
                    _ => None,
                };
                kept.map(|comparison| (name, comparison))
            })
            .collect();

        Self { tables }
    }

    /// Check if the diff is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(TableComparison::is_unchanged)
    }

    /// Number of tables with any change
    pub fn changed_tables(&self) -> usize {
        self.tables.values().filter(|t| !t.is_unchanged()).count()
    }
}

fn comparison_label(comparison: &TableComparison) -> &'static str {
    match comparison {
        TableComparison::Unchanged => "unchanged",
        TableComparison::SourceOnly => "source_only",
        TableComparison::DestinationOnly { .. } => "destination_only",
        TableComparison::Changed { .. } => "changed",
    }
}

fn extract_existing(name: &str, sql: &str, config: &SyncConfig) -> Result<String> {
    extract_table_statement(name, sql, config.strip_schema_qualifier)?
        .ok_or_else(|| Error::TableNotFound(name.to_string()))
}

/// Build the pretty-printed CREATE statement for a destination-only table
fn create_table_sql(name: &str, destination: &str, config: &SyncConfig) -> Result<String> {
    let mut sql = extract_existing(name, destination, config)?;

    if config.ignore_auto_increment {
        sql = AUTO_INCREMENT_OPTION.replace_all(&sql, "").into_owned();
    }
    if config.strip_if_not_exists_from_source {
        sql = IF_NOT_EXISTS.replace_all(&sql, "").into_owned();
    }
    if config.force_if_not_exists_on_create {
        sql = CREATE_TABLE_HEAD
            .replace(&sql, "${1}IF NOT EXISTS ${2}")
            .into_owned();
    }

    Ok(split_table_schema(name, &sql, config)?.render_pretty())
}

/// Compare the statements of one table present in both schemas
pub fn compare_table_sql(
    table_name: &str,
    source_sql: &str,
    destination_sql: &str,
    config: &SyncConfig,
) -> Result<Vec<DeclarationDiff>> {
    let source = split_table_schema(table_name, source_sql, config)?;
    let destination = split_table_schema(table_name, destination_sql, config)?;

    let source_map = build_declaration_map(&source.declarations);
    let mut destination_map = build_declaration_map(&destination.declarations);
    add_foreign_key_indexes(&mut destination_map);

    let diffs = diff_declarations(&source_map, &destination_map);
    for diff in &diffs {
        tracing::trace!(table = table_name, diff = ?diff, "Declaration differs");
    }

    Ok(diffs)
}

/// Give every foreign-key constraint without a usable index a plain index
/// named after the constraint, the way MySQL creates one
///
/// An index is usable when its leading columns are the constraint's columns.
/// This only runs on the destination side; the same schema on both sides
/// still compares equal because a constraint that already has a usable
/// index, under any name, gets nothing added.
fn add_foreign_key_indexes(declarations: &mut DeclarationMap) {
    let missing: Vec<_> = declarations
        .iter()
        .filter_map(|(key, line)| {
            let index_key = key.supporting_index()?;
            if declarations.contains_key(&index_key) {
                return None;
            }
            let caps = FOREIGN_KEY_CONSTRAINT.captures(line)?;
            if has_index_on(declarations, &column_names(&caps[2])) {
                return None;
            }
            Some((index_key, format!("KEY {} {}", quote_identifier(&caps[1]), &caps[2])))
        })
        .collect();

    for (key, line) in missing {
        declarations.insert(key, line);
    }
}

/// Whether some key's leading columns are exactly `columns`
fn has_index_on(declarations: &DeclarationMap, columns: &[&str]) -> bool {
    declarations
        .values()
        .filter_map(|line| KeyDeclaration::parse(line))
        .any(|key| {
            let indexed = key.column_names();
            indexed.len() >= columns.len()
                && indexed
                    .iter()
                    .zip(columns)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
        })
}

/// Walk the union of both sides' keys in sort order and record differences
fn diff_declarations(
    source: &DeclarationMap,
    destination: &DeclarationMap,
) -> Vec<DeclarationDiff> {
    let all_keys: BTreeSet<_> = source.keys().chain(destination.keys()).collect();

    all_keys
        .into_iter()
        .filter_map(|key| match (source.get(key), destination.get(key)) {
            (Some(src), None) => Some(DeclarationDiff::Removed {
                source: src.clone(),
            }),
            (None, Some(dst)) => Some(DeclarationDiff::Added {
                destination: dst.clone(),
            }),
            (Some(src), Some(dst)) if normalize_expression(src) != normalize_expression(dst) => {
                Some(DeclarationDiff::Modified {
                    source: src.clone(),
                    destination: dst.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::keys::classify;
    use pretty_assertions::assert_eq;

    fn config() -> SyncConfig {
        SyncConfig::default()
    }

    #[test]
    fn test_identical_tables_have_no_diffs() {
        let sql = "CREATE TABLE `a` (`id` INT NOT NULL, PRIMARY KEY (`id`)) ENGINE=InnoDB";
        assert!(compare_table_sql("a", sql, sql, &config()).unwrap().is_empty());
    }

    #[test]
    fn test_added_removed_modified() {
        let source = "CREATE TABLE `a` (`id` INT(11), `old` TEXT, `n` VARCHAR(10))";
        let destination = "CREATE TABLE `a` (`id` INT, `n` VARCHAR(20), `new` TEXT)";
        let diffs = compare_table_sql("a", source, destination, &config()).unwrap();

        assert_eq!(
            diffs,
            vec![
                DeclarationDiff::Modified {
                    source: "`n` VARCHAR(10)".to_string(),
                    destination: "`n` VARCHAR(20)".to_string(),
                },
                DeclarationDiff::Added {
                    destination: "`new` TEXT".to_string(),
                },
                DeclarationDiff::Removed {
                    source: "`old` TEXT".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_foreign_key_index_is_synthesized() {
        let mut map = build_declaration_map(&[
            "`a` INT(11)".to_string(),
            "CONSTRAINT `fk_a` FOREIGN KEY (`a`) REFERENCES `b` (`id`)".to_string(),
            "CONSTRAINT `chk` CHECK (`a` > 0)".to_string(),
        ]);
        add_foreign_key_indexes(&mut map);

        assert_eq!(map.len(), 4);
        assert_eq!(map[&classify("KEY `fk_a` (`a`)")], "KEY `fk_a` (`a`)");
    }

    #[test]
    fn test_existing_foreign_key_index_is_kept() {
        let mut map = build_declaration_map(&[
            "KEY `fk_a` (`a`, `c`)".to_string(),
            "CONSTRAINT `fk_a` FOREIGN KEY (`a`) REFERENCES `b` (`id`)".to_string(),
        ]);
        add_foreign_key_indexes(&mut map);

        assert_eq!(map.len(), 2);
        assert_eq!(map[&classify("KEY `fk_a` (`a`)")], "KEY `fk_a` (`a`, `c`)");
    }

    #[test]
    fn test_foreign_key_with_differently_named_index() {
        let mut map = build_declaration_map(&[
            "KEY `idx_a` (`a`, `c`)".to_string(),
            "CONSTRAINT `fk_a` FOREIGN KEY (`a`) REFERENCES `b` (`id`)".to_string(),
        ]);
        add_foreign_key_indexes(&mut map);
        assert_eq!(map.len(), 2);

        let sql = concat!(
            "CREATE TABLE `a` (`a` INT(11), `c` INT(11), KEY `idx_a` (`a`, `c`), ",
            "CONSTRAINT `fk_a` FOREIGN KEY (`a`) REFERENCES `b` (`id`))",
        );
        assert!(compare_table_sql("a", sql, sql, &config()).unwrap().is_empty());
    }

    #[test]
    fn test_index_not_leading_with_foreign_key_columns() {
        let mut map = build_declaration_map(&[
            "KEY `idx_c` (`c`, `a`)".to_string(),
            "CONSTRAINT fk_a FOREIGN KEY (`a`) REFERENCES `b` (`id`)".to_string(),
        ]);
        add_foreign_key_indexes(&mut map);
        assert_eq!(map[&classify("KEY `fk_a` (`a`)")], "KEY `fk_a` (`a`)");
    }

    #[test]
    fn test_generate_classifies_tables() {
        let source = concat!(
            "CREATE TABLE `a` (`id` INT); CREATE TABLE `b` (`id` INT); ",
            "CREATE TABLE `c` (`id` INT);",
        );
        let destination = concat!(
            "CREATE TABLE `d` (`id` INT); CREATE TABLE `c` (`id` BIGINT); ",
            "CREATE TABLE `a` (`id` INT);",
        );
        let diff = SchemaDiff::generate(source, destination, &config()).unwrap();

        let names: Vec<&str> = diff.tables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert!(diff.tables["a"].is_unchanged());
        assert!(diff.tables["b"].is_source_only());
        assert_eq!(diff.tables["c"].diffs().len(), 1);
        assert_eq!(
            diff.tables["d"].destination_only(),
            Some("CREATE TABLE IF NOT EXISTS `d` (\n    `id` INT(11)\n)")
        );
        assert_eq!(diff.changed_tables(), 3);
    }

    #[test]
    fn test_create_statement_rewrites() {
        let destination =
            "CREATE TABLE IF NOT EXISTS `d` (`id` INT) ENGINE=InnoDB AUTO_INCREMENT=7;";
        let keep = SyncConfig {
            ignore_auto_increment: false,
            strip_if_not_exists_from_source: false,
            force_if_not_exists_on_create: false,
            ..config()
        };
        let diff = SchemaDiff::generate("", destination, &keep).unwrap();
        assert_eq!(
            diff.tables["d"].destination_only(),
            Some(concat!(
                "CREATE TABLE IF NOT EXISTS `d` (\n    `id` INT(11)\n) ",
                "ENGINE=InnoDB AUTO_INCREMENT=7"
            ))
        );

        let strip = SyncConfig {
            force_if_not_exists_on_create: false,
            ..config()
        };
        let diff = SchemaDiff::generate("", destination, &strip).unwrap();
        assert_eq!(
            diff.tables["d"].destination_only(),
            Some("CREATE TABLE `d` (\n    `id` INT(11)\n) ENGINE=InnoDB")
        );
    }

    #[test]
    fn test_filter_by_action() {
        let source = "CREATE TABLE `a` (`x` INT, `y` INT); CREATE TABLE `b` (`id` INT);";
        let destination = "CREATE TABLE `a` (`x` BIGINT, `z` INT); CREATE TABLE `c` (`id` INT);";
        let diff = SchemaDiff::generate(source, destination, &config()).unwrap();

        let filtered = diff
            .clone()
            .filter(&ActionSet::only(&[ActionKind::Add, ActionKind::Modify]));
        let names: Vec<&str> = filtered.tables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a"]);
        assert!(filtered.tables["a"]
            .diffs()
            .iter()
            .all(|d| d.action() != ActionKind::Remove));
        assert_eq!(filtered.tables["a"].diffs().len(), 2);

        let filtered = diff.filter(&ActionSet::only(&[ActionKind::Drop]));
        let names: Vec<&str> = filtered.tables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["b"]);
    }
}
