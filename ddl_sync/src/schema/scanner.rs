//! Quote, comment and bracket aware scanning over raw SQL text
//!
//! These routines walk the byte stream with a small state machine instead of
//! parsing SQL. All delimiters they look for are ASCII, so byte offsets they
//! return are always valid `str` slice boundaries.
//!
//! String literals have no escape handling: a backslash-escaped quote closes
//! the string it appears in. Schemas that rely on `\'` inside defaults or
//! comments will be split at the wrong place.

use crate::error::{Error, Result};

/// Scanner state while walking SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    SingleQuote,
    DoubleQuote,
    LineComment,
    BlockComment,
}

impl ScanState {
    /// The state entered when `byte` is seen in normal text, if it opens a string
    fn opened_by(byte: u8) -> Option<Self> {
        match byte {
            b'\'' => Some(ScanState::SingleQuote),
            b'"' => Some(ScanState::DoubleQuote),
            _ => None,
        }
    }

    /// Whether `byte` closes the string this state represents
    fn closed_by(self, byte: u8) -> bool {
        match self {
            ScanState::SingleQuote => byte == b'\'',
            ScanState::DoubleQuote => byte == b'"',
            _ => false,
        }
    }
}

/// Remove `--`, `#` and `/* */` comments outside string literals
///
/// Line comments end at the newline, which is kept.
pub fn strip_comments(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut result = String::with_capacity(sql.len());
    let mut state = ScanState::Normal;
    let mut kept_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        let next = bytes.get(i + 1).copied();

        match state {
            ScanState::Normal => match byte {
                b'-' if next == Some(b'-') => {
                    result.push_str(&sql[kept_from..i]);
                    state = ScanState::LineComment;
                    i += 2;
                    continue;
                }
                b'#' => {
                    result.push_str(&sql[kept_from..i]);
                    state = ScanState::LineComment;
                }
                b'/' if next == Some(b'*') => {
                    result.push_str(&sql[kept_from..i]);
                    state = ScanState::BlockComment;
                    i += 2;
                    continue;
                }
                _ => {
                    if let Some(opened) = ScanState::opened_by(byte) {
                        state = opened;
                    }
                }
            },
            ScanState::SingleQuote | ScanState::DoubleQuote => {
                if state.closed_by(byte) {
                    state = ScanState::Normal;
                }
            }
            ScanState::LineComment => {
                if byte == b'\n' {
                    state = ScanState::Normal;
                    kept_from = i;
                }
            }
            ScanState::BlockComment => {
                if byte == b'*' && next == Some(b'/') {
                    state = ScanState::Normal;
                    i += 2;
                    kept_from = i;
                    continue;
                }
            }
        }

        i += 1;
    }

    if !matches!(state, ScanState::LineComment | ScanState::BlockComment) {
        result.push_str(&sql[kept_from..]);
    }

    result
}

/// Find the next `delimiter` at or after `offset` that is outside any string
///
/// With `skip_in_brackets`, delimiters nested inside parentheses opened after
/// `offset` are skipped; the bracket depth must be back at its starting level.
pub fn find_delimiter(
    sql: &str,
    offset: usize,
    delimiter: char,
    skip_in_brackets: bool,
) -> Option<usize> {
    debug_assert!(delimiter.is_ascii(), "delimiters must be ASCII");
    let target = delimiter as u8;
    let mut state = ScanState::Normal;
    let mut depth: i32 = 0;

    for (pos, &byte) in sql.as_bytes().iter().enumerate().skip(offset) {
        if state != ScanState::Normal {
            if state.closed_by(byte) {
                state = ScanState::Normal;
            }
            continue;
        }

        if byte == target && depth == 0 {
            return Some(pos);
        }

        if let Some(opened) = ScanState::opened_by(byte) {
            state = opened;
        } else if skip_in_brackets {
            match byte {
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {}
            }
        }
    }

    None
}

/// Like [`find_delimiter`], but reaching the end of input is a syntax error
pub fn require_delimiter(
    sql: &str,
    offset: usize,
    delimiter: char,
    skip_in_brackets: bool,
) -> Result<usize> {
    find_delimiter(sql, offset, delimiter, skip_in_brackets)
        .ok_or(Error::SyntaxError { delimiter })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_comments() {
        let sql = "CREATE TABLE a ( -- the table\n  id INT # mysql style\n);";
        assert_eq!(strip_comments(sql), "CREATE TABLE a ( \n  id INT \n);");
    }

    #[test]
    fn test_strip_block_comments() {
        let sql = "CREATE /* multi\nline */TABLE a (id INT);";
        assert_eq!(strip_comments(sql), "CREATE TABLE a (id INT);");
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let sql = "`a` VARCHAR(10) DEFAULT '--x' COMMENT \"#1 /* not */\"";
        assert_eq!(strip_comments(sql), sql);
    }

    #[test]
    fn test_unterminated_block_comment_drops_rest() {
        assert_eq!(strip_comments("a /* b"), "a ");
    }

    #[test]
    fn test_trailing_dash_is_not_a_comment() {
        assert_eq!(strip_comments("a -"), "a -");
    }

    #[test]
    fn test_find_delimiter_skips_strings() {
        let sql = "DEFAULT 'a;b' ;";
        assert_eq!(find_delimiter(sql, 0, ';', false), Some(14));
    }

    #[test]
    fn test_find_delimiter_respects_brackets() {
        let sql = "`a` DECIMAL(10,2), `b` INT";
        assert_eq!(find_delimiter(sql, 0, ',', true), Some(17));
        assert_eq!(find_delimiter(sql, 0, ',', false), Some(14));
    }

    #[test]
    fn test_find_closing_bracket() {
        let sql = "a INT, b ENUM('x)', 'y')) ENGINE=InnoDB";
        assert_eq!(find_delimiter(sql, 0, ')', true), Some(24));
    }

    #[test]
    fn test_find_delimiter_from_offset() {
        assert_eq!(find_delimiter("a,b,c", 2, ',', false), Some(3));
    }

    #[test]
    fn test_escaped_quote_closes_string() {
        // The backslash is not an escape: the string ends at `\'` and the
        // `;` that a real SQL parser would treat as string content is found.
        let sql = r"DEFAULT 'it\'s;fine' ;";
        assert_eq!(find_delimiter(sql, 0, ';', false), Some(14));
    }

    #[test]
    fn test_missing_delimiter_is_syntax_error() {
        let err = require_delimiter("CREATE TABLE a (id INT", 0, ')', true).unwrap_err();
        assert!(matches!(err, Error::SyntaxError { delimiter: ')' }));
        assert!(err.to_string().contains("(')')"));
    }
}
