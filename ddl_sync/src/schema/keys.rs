//! Key classifier
//!
//! Assigns every declaration a sort key that aligns it with its counterpart
//! on the other side of the comparison and fixes the order diffs are emitted
//! in: constraints first, then columns, then plain keys.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::schema::normalize::{normalize_expression, normalize_key};
use crate::schema::scanner::find_delimiter;
use crate::utils::naming::{quote_identifier, unquote_identifier};

static KEY_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(PRIMARY|UNIQUE|FULLTEXT|SPATIAL)\s+)?KEY\b\s*(?:`?(\w+)`?)?\s*(?:USING\s+\w+\s*)?\(",
    )
    .unwrap()
});

static CONSTRAINT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^CONSTRAINT\s+(`?\w+`?)").unwrap());

static COLUMN_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^`?\w+`?").unwrap());

/// Lines starting with one of these words never declare a column
static NON_COLUMN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:CONSTRAINT|FOREIGN|PRIMARY|UNIQUE|KEY|INDEX|FULLTEXT|SPATIAL|CHECK)\b")
        .unwrap()
});

/// Comparison priority of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Constraint,
    Column,
    Key,
}

impl Priority {
    fn marker(self) -> &'static str {
        match self {
            Priority::Constraint => "!!",
            Priority::Column => "!",
            Priority::Key => "",
        }
    }
}

/// Identity and ordering of one declaration within a table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    priority: Priority,
    name: String,
}

impl SortKey {
    pub fn new(priority: Priority, name: impl Into<String>) -> Self {
        Self {
            priority,
            name: name.into(),
        }
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The normalized declaration prefix, e.g. ``unique key `email` ``
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plain-key entry a foreign-key constraint needs as supporting index
    pub fn supporting_index(&self) -> Option<SortKey> {
        if self.priority != Priority::Constraint {
            return None;
        }
        let rest = self.name.strip_prefix("constraint")?;
        Some(SortKey::new(Priority::Key, format!("key{}", rest)))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.priority.marker(), self.name)
    }
}

/// A parsed `[PRIMARY|UNIQUE|FULLTEXT|SPATIAL] KEY [name] (columns) ...` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDeclaration<'a> {
    kind: Option<String>,
    name: Option<&'a str>,
    columns: &'a str,
    body: &'a str,
}

impl<'a> KeyDeclaration<'a> {
    pub fn parse(text: &'a str) -> Option<Self> {
        let caps = KEY_DECLARATION.captures(text)?;
        let open = caps.get(0)?.end() - 1;
        let close = find_delimiter(text, open + 1, ')', true).unwrap_or(text.len() - 1);

        Some(Self {
            kind: caps.get(1).map(|m| m.as_str().to_uppercase()),
            name: caps.get(2).map(|m| m.as_str()),
            columns: &text[open..=close],
            body: &text[open..],
        })
    }

    /// `PRIMARY`, `UNIQUE`, `FULLTEXT` or `SPATIAL`; `None` for a plain key
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn is_primary(&self) -> bool {
        self.kind() == Some("PRIMARY")
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// The bracketed column list
    pub fn columns(&self) -> &str {
        self.columns
    }

    /// The indexed column names, without prefix lengths
    pub fn column_names(&self) -> Vec<&'a str> {
        column_names(self.columns)
    }

    /// The quoted index name; unnamed keys are named after their first column
    pub fn index_name(&self) -> String {
        let name = match self.name {
            Some(name) => name,
            None => self.column_names().first().copied().unwrap_or(""),
        };
        quote_identifier(name)
    }

    /// The declaration with its index name spelled out
    pub fn to_named(&self) -> String {
        match self.kind() {
            Some("PRIMARY") => format!("PRIMARY KEY {}", self.body),
            Some(kind) => format!("{} KEY {} {}", kind, self.index_name(), self.body),
            None => format!("KEY {} {}", self.index_name(), self.body),
        }
    }

    fn sort_key(&self) -> SortKey {
        let name = match self.kind() {
            Some("PRIMARY") => "primary key".to_string(),
            Some(kind) => format!("{} key {}", kind, self.index_name()),
            None => format!("key {}", self.index_name()),
        };
        SortKey::new(Priority::Key, normalize_key(&name))
    }
}

/// Unquoted column names of a bracketed list such as ``(`a`(10), `b`)``
pub fn column_names(list: &str) -> Vec<&str> {
    let inner = list.trim().trim_start_matches('(').trim_end_matches(')');
    inner
        .split(',')
        .filter_map(|column| column.split('(').next())
        .map(|column| unquote_identifier(column.trim()))
        .filter(|column| !column.is_empty())
        .collect()
}

/// Whether a declaration line defines a column
pub fn is_column_line(line: &str) -> bool {
    !NON_COLUMN_LINE.is_match(line) && COLUMN_PREFIX.is_match(line)
}

/// Declarations of one table side, keyed by sort key in first-seen order
///
/// A later declaration with the same key replaces the earlier text but keeps
/// its position.
pub type DeclarationMap = IndexMap<SortKey, String>;

/// Classify one declaration line
///
/// Lines that are neither keys, constraints nor columns are keyed by their
/// whole normalized text.
pub fn classify(line: &str) -> SortKey {
    if let Some(key) = KeyDeclaration::parse(line) {
        return key.sort_key();
    }

    if let Some(caps) = CONSTRAINT_PREFIX.captures(line) {
        let name = format!("constraint {}", quote_identifier(&caps[1]));
        return SortKey::new(Priority::Constraint, normalize_key(&name));
    }

    match COLUMN_PREFIX.find(line) {
        Some(m) if is_column_line(line) => {
            SortKey::new(Priority::Column, normalize_key(&quote_identifier(m.as_str())))
        }
        _ => SortKey::new(Priority::Column, normalize_expression(line)),
    }
}

/// Key every declaration of one table side
pub fn build_declaration_map(declarations: &[String]) -> DeclarationMap {
    let mut map = DeclarationMap::new();
    for line in declarations {
        map.insert(classify(line), line.clone());
    }
    map
}
