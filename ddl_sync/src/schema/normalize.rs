//! Text normalization used when comparing declarations

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const WHITESPACE: [char; 4] = [' ', '\t', '\n', '\r'];
const OPERATORS: [char; 11] = [',', '+', '-', '/', '*', '&', '<', '=', '>', '%', '^'];

/// Lowercase and collapse whitespace runs; used for sort keys
pub fn normalize_key(text: &str) -> String {
    WHITESPACE_RUN
        .replace_all(&text.to_lowercase(), " ")
        .into_owned()
}

/// Normalize an SQL expression so equivalent declarations compare equal
///
/// Outside string literals, whitespace runs collapse to one space, spaces next
/// to an operator are dropped and text is lowercased. String literal contents
/// are copied verbatim.
pub fn normalize_expression(expression: &str) -> String {
    let mut result = String::with_capacity(expression.len());
    let mut in_string: Option<char> = None;
    let mut last: Option<char> = None;

    for c in expression.chars() {
        match in_string {
            None => {
                let mut c = c;
                if c == '\'' || c == '"' {
                    in_string = Some(c);
                } else {
                    if WHITESPACE.contains(&c) {
                        if last == Some(' ') {
                            continue;
                        }
                        c = ' ';
                    }
                    if c == ' ' && last.is_some_and(|l| OPERATORS.contains(&l)) {
                        continue;
                    } else if last == Some(' ') && OPERATORS.contains(&c) {
                        result.pop();
                    }
                }
                result.extend(c.to_lowercase());
                last = Some(c);
            }
            Some(quote) => {
                if c == quote {
                    in_string = None;
                }
                result.push(c);
                last = Some(c);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("UNIQUE  KEY\n`Email`"), "unique key `email`");
    }

    #[test]
    fn test_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_expression("`id`   BIGINT(20)\n\tUNSIGNED NOT NULL"),
            "`id` bigint(20) unsigned not null"
        );
    }

    #[test]
    fn test_trims_around_operators() {
        assert_eq!(
            normalize_expression("DECIMAL(10 , 2) DEFAULT 1 + 2"),
            "decimal(10,2) default 1+2"
        );
        assert_eq!(normalize_expression("KEY `k` (`a`, `b`)"), "key `k` (`a`,`b`)");
    }

    #[test]
    fn test_string_literals_are_verbatim() {
        assert_eq!(
            normalize_expression("COMMENT 'Hello   World, Again'"),
            "comment 'Hello   World, Again'"
        );
        assert_eq!(
            normalize_expression("DEFAULT \"A 'B'\" NOT NULL"),
            "default \"A 'B'\" not null"
        );
    }

    #[test]
    fn test_equivalent_declarations() {
        assert_eq!(
            normalize_expression("`a` varchar(255)  NOT NULL DEFAULT ''"),
            normalize_expression("`a` VARCHAR(255) NOT NULL DEFAULT ''")
        );
        assert_ne!(
            normalize_expression("`a` INT DEFAULT 'x'"),
            normalize_expression("`a` INT DEFAULT 'X'")
        );
    }
}
