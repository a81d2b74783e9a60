//! Schema-body splitter
//!
//! Splits one `CREATE TABLE` statement into its declaration lines and
//! rewrites them into a canonical, comparable form.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::schema::keys::{is_column_line, KeyDeclaration};
use crate::schema::scanner::{find_delimiter, require_delimiter};
use crate::utils::naming::{get_foreign_key_name, quote_identifier};

/// Bare type keywords and the size MySQL reports for them
static DEFAULT_SIZES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("INT", "(11)"),
        ("TINYINT", "(3)"),
        ("SMALLINT", "(6)"),
        ("BIGINT", "(20)"),
        ("VARCHAR", "(255)"),
        ("DATETIME", "(6)"),
    ]
    .into_iter()
    .map(|(keyword, size)| {
        let re = Regex::new(&format!(r"(?i)(\s{})(?:\s+(\w)|\s*$)", keyword)).unwrap();
        (re, size)
    })
    .collect()
});

static BOOL_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\sBOOL(?:\s+(\w)|\s*$)").unwrap());

static AUTO_INCREMENT_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*AUTO_INCREMENT\s*=\s*[0-9]+").unwrap());

static INDEX_SYNONYM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^((?:UNIQUE|FULLTEXT|SPATIAL)\s+)?INDEX\b").unwrap());

static COLUMN_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^`?(\w+)`?").unwrap());

static INLINE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(PRIMARY\s+KEY|UNIQUE)\b(?:\s+KEY\b)?").unwrap());

static INLINE_KEY_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(?:PRIMARY\s+KEY|UNIQUE(?:\s+KEY)?)\b").unwrap());

static INLINE_REFERENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\s*\b(REFERENCES\b.*)$").unwrap());

static UNNAMED_FOREIGN_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^FOREIGN\s*KEY\s*\(\s*`?(\w+)`?.*?\bREFERENCES\b").unwrap()
});

/// One `CREATE TABLE` statement split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBody {
    /// Everything up to and including the opening parenthesis
    pub prefix: String,
    /// Canonical column, key and constraint declarations
    pub declarations: Vec<String>,
    /// The closing parenthesis and the table options after it
    pub suffix: String,
}

impl TableBody {
    /// Render the statement with one declaration per line
    pub fn render_pretty(&self) -> String {
        format!(
            "{}\n    {}\n{}",
            self.prefix,
            self.declarations.join(",\n    "),
            self.suffix
        )
    }
}

/// Declarations produced from one body segment
#[derive(Debug)]
struct LineParts {
    /// Declarations kept in place
    main: Vec<String>,
    /// Declarations appended after the last real segment
    trailing: Vec<String>,
}

impl LineParts {
    fn single(line: String) -> Self {
        Self {
            main: vec![line],
            trailing: Vec::new(),
        }
    }
}

/// Split a `CREATE TABLE` statement into prefix, declarations and suffix
pub fn split_table_schema(table_name: &str, sql: &str, config: &SyncConfig) -> Result<TableBody> {
    let open = require_delimiter(sql, 0, '(', false)?;
    let prefix = sql[..=open].to_string();
    let body = &sql[open + 1..];

    let close = require_delimiter(body, 0, ')', true)?;
    let inner = &body[..close];

    let mut declarations = Vec::new();
    let mut trailing = Vec::new();
    let mut start = 0;

    loop {
        let end = find_delimiter(inner, start, ',', true);
        let segment = inner[start..end.unwrap_or(inner.len())].trim();

        if !segment.is_empty() {
            let parts = process_line(table_name, segment, config);
            declarations.extend(parts.main);
            trailing.extend(parts.trailing);
        }

        match end {
            Some(pos) => start = pos + 1,
            None => break,
        }
    }

    declarations.extend(trailing);

    let mut suffix = body[close..].trim().to_string();
    if config.ignore_auto_increment {
        suffix = AUTO_INCREMENT_OPTION.replace_all(&suffix, "").into_owned();
    }

    Ok(TableBody {
        prefix,
        declarations,
        suffix,
    })
}

/// Canonicalize one declaration and extract inline keys and references
fn process_line(table_name: &str, line: &str, config: &SyncConfig) -> LineParts {
    let mut line = INDEX_SYNONYM.replace(line, "${1}KEY").into_owned();
    let named = KeyDeclaration::parse(&line)
        .filter(|key| !key.is_primary() && !key.is_named())
        .map(|key| key.to_named());
    if let Some(named) = named {
        line = named;
    }
    line = apply_default_sizes(&line);

    if config.ignore_auto_increment {
        line = AUTO_INCREMENT_OPTION.replace_all(&line, "").into_owned();
    }

    if let Some(parts) = extract_inline_key(&line) {
        return parts;
    }

    if let Some(parts) = extract_inline_reference(table_name, &line, &config.foreign_key_pattern) {
        return parts;
    }

    if let Some(caps) = UNNAMED_FOREIGN_KEY.captures(&line) {
        let column = &caps[1];
        let name = quote_identifier(&get_foreign_key_name(
            &config.foreign_key_pattern,
            table_name,
            column,
        ));
        return LineParts {
            main: vec![
                format!("KEY {} ({})", name, quote_identifier(column)),
                format!("CONSTRAINT {} {}", name, line),
            ],
            trailing: Vec::new(),
        };
    }

    LineParts::single(line)
}

/// Give bare integer, varchar and datetime types their default size
fn apply_default_sizes(line: &str) -> String {
    let mut result = line.to_string();

    for (re, size) in DEFAULT_SIZES.iter() {
        result = re
            .replace_all(&result, |caps: &Captures| sized(&caps[1], size, caps.get(2)))
            .into_owned();
    }

    BOOL_TYPE
        .replace_all(&result, |caps: &Captures| sized(" TINYINT", "(1)", caps.get(1)))
        .into_owned()
}

fn sized(keyword: &str, size: &str, next: Option<regex::Match<'_>>) -> String {
    match next {
        Some(word) => format!("{}{} {}", keyword, size, word.as_str()),
        None => format!("{}{}", keyword, size),
    }
}

/// Split a column declaration into its leading identifier and the rest
fn split_column(line: &str) -> Option<(&str, &str)> {
    if !is_column_line(line) {
        return None;
    }
    let caps = COLUMN_NAME.captures(line)?;
    let whole = caps.get(0)?;
    Some((caps.get(1)?.as_str(), &line[whole.end()..]))
}

/// `col ... PRIMARY KEY` / `col ... UNIQUE [KEY]` become trailing key declarations
fn extract_inline_key(line: &str) -> Option<LineParts> {
    let (column, rest) = split_column(line)?;
    let caps = INLINE_KEY.captures(rest)?;
    let is_primary = caps[1].to_uppercase().starts_with("PRIMARY");

    let head = &line[..line.len() - rest.len()];
    let stripped = format!("{}{}", head, INLINE_KEY_CLAUSE.replace_all(rest, ""));

    let quoted = quote_identifier(column);
    let key = if is_primary {
        format!("PRIMARY KEY ({})", quoted)
    } else {
        format!("UNIQUE KEY {} ({})", quoted, quoted)
    };

    Some(LineParts {
        main: vec![stripped.trim_end().to_string()],
        trailing: vec![key],
    })
}

/// `col ... REFERENCES t (c)` becomes an index plus a named foreign key
fn extract_inline_reference(table_name: &str, line: &str, pattern: &str) -> Option<LineParts> {
    let (column, rest) = split_column(line)?;
    let caps = INLINE_REFERENCES.captures(rest)?;
    let references = caps.get(1)?.as_str();
    let clause = caps.get(0)?;

    let head = &line[..line.len() - rest.len()];
    let stripped = format!("{}{}", head, &rest[..clause.start()]);

    let name = quote_identifier(&get_foreign_key_name(pattern, table_name, column));
    let quoted = quote_identifier(column);

    Some(LineParts {
        main: vec![stripped.trim_end().to_string()],
        trailing: vec![
            format!("KEY {} ({})", name, quoted),
            format!("CONSTRAINT {} FOREIGN KEY ({}) {}", name, quoted, references),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn split(sql: &str) -> TableBody {
        split_table_schema("post", sql, &SyncConfig::default()).unwrap()
    }

    #[test]
    fn test_split_prefix_declarations_suffix() {
        let body = split(concat!(
            "CREATE TABLE `post` (\n  `id` INT(11) NOT NULL,\n  `price` DECIMAL(10,2),\n",
            "  PRIMARY KEY (`id`)\n) ENGINE=InnoDB",
        ));
        assert_eq!(body.prefix, "CREATE TABLE `post` (");
        assert_eq!(
            body.declarations,
            vec!["`id` INT(11) NOT NULL", "`price` DECIMAL(10,2)", "PRIMARY KEY (`id`)"]
        );
        assert_eq!(body.suffix, ") ENGINE=InnoDB");
    }

    #[test]
    fn test_default_sizes() {
        assert_eq!(apply_default_sizes("`a` INT NOT NULL"), "`a` INT(11) NOT NULL");
        assert_eq!(apply_default_sizes("`a` bigint unsigned"), "`a` bigint(20) unsigned");
        assert_eq!(apply_default_sizes("`a` TINYINT"), "`a` TINYINT(3)");
        assert_eq!(apply_default_sizes("`a` SMALLINT  DEFAULT 0"), "`a` SMALLINT(6) DEFAULT 0");
        assert_eq!(apply_default_sizes("`a` VARCHAR NOT NULL"), "`a` VARCHAR(255) NOT NULL");
        assert_eq!(apply_default_sizes("`a` DATETIME NOT NULL"), "`a` DATETIME(6) NOT NULL");
        assert_eq!(apply_default_sizes("`a` BOOL NOT NULL"), "`a` TINYINT(1) NOT NULL");
        assert_eq!(apply_default_sizes("`a` INT(10) NOT NULL"), "`a` INT(10) NOT NULL");
        assert_eq!(apply_default_sizes("`a` INTEGER NOT NULL"), "`a` INTEGER NOT NULL");
        assert_eq!(apply_default_sizes("`a` BOOLEAN"), "`a` BOOLEAN");
    }

    #[test]
    fn test_inline_primary_key() {
        let body = split(concat!(
            "CREATE TABLE `post` ",
            "(`id` BIGINT UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT, `t` TEXT)",
        ));
        assert_eq!(
            body.declarations,
            vec![
                "`id` BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT",
                "`t` TEXT",
                "PRIMARY KEY (`id`)",
            ]
        );
    }

    #[test]
    fn test_inline_unique() {
        let body =
            split("CREATE TABLE post (email VARCHAR(255) NOT NULL UNIQUE KEY, `unique_code` INT)");
        assert_eq!(
            body.declarations,
            vec![
                "email VARCHAR(255) NOT NULL",
                "`unique_code` INT(11)",
                "UNIQUE KEY `email` (`email`)",
            ]
        );
    }

    #[test]
    fn test_inline_references() {
        let body = split(concat!(
            "CREATE TABLE post ",
            "(`author_id` INT NOT NULL REFERENCES `user` (`id`) ON DELETE CASCADE)",
        ));
        assert_eq!(
            body.declarations,
            vec![
                "`author_id` INT(11) NOT NULL",
                "KEY `fk_post_author_id` (`author_id`)",
                concat!(
                    "CONSTRAINT `fk_post_author_id` FOREIGN KEY (`author_id`) ",
                    "REFERENCES `user` (`id`) ON DELETE CASCADE",
                ),
            ]
        );
    }

    #[test]
    fn test_unnamed_foreign_key() {
        let body = split(concat!(
            "CREATE TABLE post ",
            "(`author_id` INT(11), FOREIGN KEY (`author_id`) REFERENCES `user` (`id`))",
        ));
        assert_eq!(
            body.declarations,
            vec![
                "`author_id` INT(11)",
                "KEY `fk_post_author_id` (`author_id`)",
                "CONSTRAINT `fk_post_author_id` FOREIGN KEY (`author_id`) REFERENCES `user` (`id`)",
            ]
        );
    }

    #[test]
    fn test_foreign_key_pattern_is_configurable() {
        let config = SyncConfig {
            foreign_key_pattern: "{table}_{column}_fk".to_string(),
            ..SyncConfig::default()
        };
        let sql = "CREATE TABLE post (`a` INT(11) REFERENCES b (id))";
        let body = split_table_schema("post", sql, &config).unwrap();
        assert_eq!(body.declarations[1], "KEY `post_a_fk` (`a`)");
    }

    #[test]
    fn test_index_synonym() {
        let body =
            split("CREATE TABLE post (`a` INT(11), UNIQUE INDEX `ua` (`a`), INDEX ia (`a`))");
        assert_eq!(
            body.declarations,
            vec!["`a` INT(11)", "UNIQUE KEY `ua` (`a`)", "KEY ia (`a`)"]
        );
    }

    #[test]
    fn test_unnamed_keys_are_named_after_first_column() {
        let body = split(concat!(
            "CREATE TABLE post (`a` INT(11), `b` INT(11), ",
            "UNIQUE KEY (`a`), INDEX (`b`, `a`), PRIMARY KEY (`a`))",
        ));
        assert_eq!(
            body.declarations,
            vec![
                "`a` INT(11)",
                "`b` INT(11)",
                "UNIQUE KEY `a` (`a`)",
                "KEY `b` (`b`, `a`)",
                "PRIMARY KEY (`a`)",
            ]
        );
    }

    #[test]
    fn test_auto_increment_option() {
        let body = split(
            "CREATE TABLE post (`a` INT(11)) ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=utf8",
        );
        assert_eq!(body.suffix, ") ENGINE=InnoDB DEFAULT CHARSET=utf8");

        let config = SyncConfig {
            ignore_auto_increment: false,
            ..SyncConfig::default()
        };
        let sql = "CREATE TABLE post (`a` INT(11)) AUTO_INCREMENT=42";
        let body = split_table_schema("post", sql, &config).unwrap();
        assert_eq!(body.suffix, ") AUTO_INCREMENT=42");
    }

    #[test]
    fn test_suffix_does_not_leak_into_declarations() {
        let body = split(concat!(
            "CREATE TABLE post (`a` INT(11),) PARTITION BY RANGE (a) ",
            "(PARTITION p0 VALUES LESS THAN (10), PARTITION p1 VALUES LESS THAN MAXVALUE)",
        ));
        assert_eq!(body.declarations, vec!["`a` INT(11)"]);
        assert!(body.suffix.starts_with(") PARTITION BY RANGE"));
    }

    #[test]
    fn test_render_pretty() {
        let body = split("CREATE TABLE `post` (`id` INT(11), PRIMARY KEY (`id`)) ENGINE=InnoDB");
        assert_eq!(
            body.render_pretty(),
            "CREATE TABLE `post` (\n    `id` INT(11),\n    PRIMARY KEY (`id`)\n) ENGINE=InnoDB"
        );
    }

    #[test]
    fn test_missing_closing_bracket() {
        let err = split_table_schema("post", "CREATE TABLE post (`a` INT", &SyncConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::SyntaxError { delimiter: ')' }));
    }
}
