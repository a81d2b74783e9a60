//! Type definitions for schema comparison results

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The kinds of change a caller may allow through the action filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// CREATE TABLE for a destination-only table
    Create,
    /// DROP TABLE for a source-only table
    Drop,
    /// A declaration present only in the destination
    Add,
    /// A declaration present only in the source
    Remove,
    /// A declaration present on both sides with a different body
    Modify,
}

impl ActionKind {
    /// Every action kind, in declaration order
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Create,
        ActionKind::Drop,
        ActionKind::Add,
        ActionKind::Remove,
        ActionKind::Modify,
    ];

    /// The SQL keyword emitted for this action
    pub fn keyword(self) -> &'static str {
        match self {
            ActionKind::Create => "CREATE",
            ActionKind::Drop | ActionKind::Remove => "DROP",
            ActionKind::Add => "ADD",
            ActionKind::Modify => "MODIFY",
        }
    }

    /// The lowercase name used in configuration files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Drop => "drop",
            ActionKind::Add => "add",
            ActionKind::Remove => "remove",
            ActionKind::Modify => "modify",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidAction(format!(
                "unknown action '{}', expected one of create, drop, add, remove, modify",
                s.trim()
            )))
    }
}

/// A closed set of allowed actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<ActionKind>);

impl ActionSet {
    /// A set allowing every action
    pub fn all() -> Self {
        ActionKind::ALL.into_iter().collect()
    }

    /// A set allowing only the given actions
    pub fn only(actions: &[ActionKind]) -> Self {
        actions.iter().copied().collect()
    }

    /// Check whether an action is allowed
    pub fn contains(&self, action: ActionKind) -> bool {
        self.0.contains(&action)
    }
}

impl Default for ActionSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<ActionKind> for ActionSet {
    fn from_iter<I: IntoIterator<Item = ActionKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One column, index or constraint declaration that differs between schemas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationDiff {
    /// Present only in the source schema
    Removed { source: String },
    /// Present only in the destination schema
    Added { destination: String },
    /// Present on both sides with a different normalized body
    Modified { source: String, destination: String },
}

impl DeclarationDiff {
    /// The source-side declaration text, if any
    pub fn source_text(&self) -> Option<&str> {
        match self {
            DeclarationDiff::Removed { source } | DeclarationDiff::Modified { source, .. } => {
                Some(source)
            }
            DeclarationDiff::Added { .. } => None,
        }
    }

    /// The destination-side declaration text, if any
    pub fn destination_text(&self) -> Option<&str> {
        match self {
            DeclarationDiff::Added { destination }
            | DeclarationDiff::Modified { destination, .. } => Some(destination),
            DeclarationDiff::Removed { .. } => None,
        }
    }

    /// The action this diff represents
    pub fn action(&self) -> ActionKind {
        match self {
            DeclarationDiff::Removed { .. } => ActionKind::Remove,
            DeclarationDiff::Added { .. } => ActionKind::Add,
            DeclarationDiff::Modified { .. } => ActionKind::Modify,
        }
    }

    /// The declaration text the generated statement is built from
    pub fn statement_text(&self) -> &str {
        match self {
            DeclarationDiff::Removed { source } => source,
            DeclarationDiff::Added { destination }
            | DeclarationDiff::Modified { destination, .. } => destination,
        }
    }
}

/// The comparison outcome for one table name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableComparison {
    /// Identical in both schemas
    Unchanged,
    /// Present only in the source schema, to be dropped
    SourceOnly,
    /// Present only in the destination schema; carries the pretty-printed CREATE statement
    DestinationOnly { create_statement: String },
    /// Present in both schemas with declaration-level differences
    Changed { diffs: Vec<DeclarationDiff> },
}

impl TableComparison {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, TableComparison::Unchanged)
    }

    pub fn is_source_only(&self) -> bool {
        matches!(self, TableComparison::SourceOnly)
    }

    pub fn destination_only(&self) -> Option<&str> {
        match self {
            TableComparison::DestinationOnly { create_statement } => Some(create_statement),
            _ => None,
        }
    }

    pub fn diffs(&self) -> &[DeclarationDiff] {
        match self {
            TableComparison::Changed { diffs } => diffs,
            _ => &[],
        }
    }
}

/// The phase a generated statement is placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Index and constraint drops, issued before anything else
    Before,
    /// Structural column changes and whole-table statements
    Middle,
    /// New indexes, new constraints and column drops
    After,
}
