//! Migration generator
//!
//! This module turns a filtered schema diff into ordered SQL statements.
//! Each statement lands in one of three buckets so that index and constraint
//! drops run first and new indexes, constraints and column drops run last.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::diff::SchemaDiff;
use crate::schema::keys::{is_column_line, KeyDeclaration};
use crate::schema::types::{ActionKind, Bucket, TableComparison};
use crate::utils::naming::{first_word, quote_identifier};

static CONSTRAINT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^CONSTRAINT\s+(`?\w+`?)").unwrap());

static FOREIGN_KEY_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFOREIGN\s+KEY\b").unwrap());

/// Statements collected per bucket, in emission order
#[derive(Debug, Default)]
pub struct StatementPlan {
    before: Vec<String>,
    middle: Vec<String>,
    after: Vec<String>,
}

impl StatementPlan {
    pub fn push(&mut self, bucket: Bucket, statement: String) {
        match bucket {
            Bucket::Before => self.before.push(statement),
            Bucket::Middle => self.middle.push(statement),
            Bucket::After => self.after.push(statement),
        }
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.middle.len() + self.after.len()
    }

    /// Concatenate the buckets: before, then middle, then after
    pub fn into_statements(self) -> Vec<String> {
        let mut statements = self.before;
        statements.extend(self.middle);
        statements.extend(self.after);
        statements
    }
}

/// Generate the ordered statements for a (filtered) schema diff
pub fn generate_migration_sql(diff: &SchemaDiff) -> Vec<String> {
    let mut plan = StatementPlan::default();

    for (table, comparison) in &diff.tables {
        match comparison {
            TableComparison::Unchanged => {}
            TableComparison::SourceOnly => {
                plan.push(Bucket::Middle, format!("DROP TABLE {}", quote_identifier(table)));
            }
            TableComparison::DestinationOnly { create_statement } => {
                plan.push(Bucket::Middle, create_statement.clone());
            }
            TableComparison::Changed { diffs } => {
                for diff in diffs {
                    match compile_statement(table, diff.statement_text(), diff.action()) {
                        Some((statement, bucket)) => plan.push(bucket, statement),
                        None => tracing::warn!(
                            table = %table,
                            declaration = diff.statement_text(),
                            "Cannot drop an unnamed declaration, skipped"
                        ),
                    }
                }
            }
        }
    }

    tracing::debug!(
        total = plan.len(),
        before = plan.before.len(),
        middle = plan.middle.len(),
        after = plan.after.len(),
        "Generated migration statements"
    );

    plan.into_statements()
}

/// Join statements into one script, each terminated by `;`
pub fn render_script(statements: &[String]) -> String {
    if statements.is_empty() {
        String::new()
    } else {
        format!("{};", statements.join(";\n"))
    }
}

fn drop_key_clause(key: &KeyDeclaration) -> String {
    if key.is_primary() {
        "DROP PRIMARY KEY".to_string()
    } else {
        format!("DROP INDEX {}", key.index_name())
    }
}

fn add_key_clause(key: &KeyDeclaration) -> String {
    match key.kind() {
        Some("PRIMARY") => format!("ADD PRIMARY KEY {}", key.columns()),
        None => format!("ADD INDEX {} {}", key.index_name(), key.columns()),
        Some(kind) => format!("ADD {} {} {}", kind, key.index_name(), key.columns()),
    }
}

/// The clause dropping a named constraint
fn drop_constraint_clause(text: &str) -> Option<String> {
    let caps = CONSTRAINT_NAME.captures(text)?;
    let name = quote_identifier(&caps[1]);
    if FOREIGN_KEY_CLAUSE.is_match(text) {
        Some(format!("DROP FOREIGN KEY {}", name))
    } else {
        Some(format!("DROP CONSTRAINT {}", name))
    }
}

/// Compile one declaration change into an `ALTER TABLE` statement and its bucket
///
/// `text` is the source declaration for removals and the destination
/// declaration otherwise. Returns `None` for the removal of a declaration
/// that has no name to drop it by, such as a bare `CHECK (...)`.
pub fn compile_statement(table: &str, text: &str, action: ActionKind) -> Option<(String, Bucket)> {
    let alter = format!("ALTER TABLE {} ", quote_identifier(table));
    let removing = matches!(action, ActionKind::Remove | ActionKind::Drop);

    if let Some(key) = KeyDeclaration::parse(text) {
        return Some(match action {
            ActionKind::Remove | ActionKind::Drop => {
                (format!("{}{}", alter, drop_key_clause(&key)), Bucket::Before)
            }
            ActionKind::Modify => (
                format!("{}{}, {}", alter, drop_key_clause(&key), add_key_clause(&key)),
                Bucket::Before,
            ),
            ActionKind::Add | ActionKind::Create => {
                (format!("{}{}", alter, add_key_clause(&key)), Bucket::After)
            }
        });
    }

    let constraint_drop = drop_constraint_clause(text);
    let add = ActionKind::Add.keyword();

    if removing {
        return match constraint_drop {
            Some(clause) => Some((format!("{}{}", alter, clause), Bucket::Before)),
            None if is_column_line(text) => Some((
                format!("{}{} {}", alter, action.keyword(), first_word(text)),
                Bucket::After,
            )),
            None => None,
        };
    }

    Some(match (action, constraint_drop) {
        (ActionKind::Modify, Some(clause)) => (
            format!("{}{}; {}{} {}", alter, clause, alter, add, text),
            Bucket::Middle,
        ),
        (_, Some(_)) => (format!("{}{} {}", alter, add, text), Bucket::After),
        (ActionKind::Modify, None) if is_column_line(text) => (
            format!("{}{} {}", alter, ActionKind::Modify.keyword(), text),
            Bucket::Middle,
        ),
        (_, None) if is_column_line(text) => (format!("{}{} {}", alter, add, text), Bucket::Middle),
        (_, None) => (format!("{}{} {}", alter, add, text), Bucket::After),
    })
}
