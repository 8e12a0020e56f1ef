//! Read-Only Guard and Injection Markers
//!
//! Ad-hoc SQL from the menu, and the spliced SQL that the injection demo
//! executes, must pass through [`validate_read_only`] before it reaches the
//! database.
//!
//! # Validation Strategy
//! - Conservative pattern matching on comment-stripped, upper-cased text
//! - Only `SELECT`, `WITH`, `EXPLAIN`, `SHOW` and `VALUES` statements pass
//! - Stacked statements are rejected (a single trailing `;` is allowed)
//!
//! [`injection_markers`] inspects raw user input and names the attack
//! techniques it resembles. It is a teaching aid, not a filter: safety comes
//! from parameter binding.

use serde::Serialize;
use tracing::warn;

use crate::error::{LibraryError, Result};

/// Validate that `sql` is a single read-only statement
pub fn validate_read_only(sql: &str) -> Result<()> {
    let processed = preprocess_sql(sql)?;

    if is_read_only(&processed) {
        Ok(())
    } else {
        warn!(sql, "rejected non read-only statement");
        Err(LibraryError::unsafe_query(format!(
            "only single read-only statements (SELECT, WITH, EXPLAIN, SHOW, VALUES) \
             may run here:\n\n{sql}"
        )))
    }
}

/// Trim, strip comments, reject empty and stacked statements, collapse
/// whitespace runs to one space, upper-case
fn preprocess_sql(sql: &str) -> Result<String> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::invalid_input("Query cannot be empty"));
    }

    let stripped = strip_comments(trimmed);
    let body = stripped.trim().trim_end_matches(';').trim();

    if body.is_empty() {
        return Err(LibraryError::invalid_input("Query cannot be empty"));
    }

    if contains_unquoted_semicolon(body) {
        warn!(sql, "rejected stacked statements");
        return Err(LibraryError::unsafe_query("Multiple statements in one query are not allowed"));
    }

    Ok(body.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase())
}

/// Strip SQL comments from query
///
/// Handles:
/// - Line comments: -- comment
/// - Block comments: /* comment */
///
/// Comment markers inside quoted literals and identifiers are kept.
fn strip_comments(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut quote = None;

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                quote = toggle_quote(quote, ch);
                result.push(ch);
            }
            '-' if quote.is_none() && chars.peek() == Some(&'-') => {
                chars.next();
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            '/' if quote.is_none() && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for ch in chars.by_ref() {
                    if prev == '*' && ch == '/' {
                        break;
                    }
                    prev = ch;
                }
                result.push(' ');
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Enter a quoted run on `ch`, or leave it when `ch` closes the open one
fn toggle_quote(open: Option<char>, ch: char) -> Option<char> {
    match open {
        None => Some(ch),
        Some(q) if q == ch => None,
        other => other,
    }
}

fn contains_unquoted_semicolon(sql: &str) -> bool {
    let mut quote = None;
    for ch in sql.chars() {
        match ch {
            '\'' | '"' => quote = toggle_quote(quote, ch),
            ';' if quote.is_none() => return true,
            _ => {}
        }
    }
    false
}

/// Strip EXPLAIN/EXPLAIN ANALYZE prefix from query
fn strip_explain_prefix(sql: &str) -> &str {
    let sql = sql.trim();

    if let Some(stripped) = sql.strip_prefix("EXPLAIN ANALYZE") {
        return stripped.trim();
    }

    if let Some(stripped) = sql.strip_prefix("EXPLAIN") {
        return stripped.trim();
    }

    sql
}

fn is_read_only(sql: &str) -> bool {
    let sql = strip_explain_prefix(sql);

    // A CTE may wrap a data-modifying statement
    if sql.starts_with("WITH ") {
        return !["INSERT ", "UPDATE ", "DELETE ", "MERGE "].iter().any(|kw| sql.contains(kw));
    }

    sql.starts_with("SELECT ")
        || sql == "SELECT"
        || sql.starts_with("SHOW ")
        || sql.starts_with("VALUES")
}

/// Attack technique recognised in user input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMarker {
    /// Quote breakout followed by an always-true comparison (`' OR '1'='1`)
    Tautology,
    /// `UNION SELECT` appending rows from another table
    Union,
    /// Trailing `--` or `/*` discarding the rest of the statement
    Comment,
    /// `;` starting a second statement
    StackedStatement,
    /// `pg_sleep` and friends for blind timing probes
    TimeDelay,
    /// Forced type cast surfacing data through the error message
    CastError,
}

impl InjectionMarker {
    /// Short Russian description for the menu output
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Tautology => "тавтология (условие всегда истинно)",
            Self::Union => "UNION SELECT (подмешивание строк из другой таблицы)",
            Self::Comment => "комментарий (отбрасывает остаток запроса)",
            Self::StackedStatement => "второй оператор через ';'",
            Self::TimeDelay => "задержка по времени (слепая инъекция)",
            Self::CastError => "ошибка приведения типа (утечка через сообщение об ошибке)",
        }
    }
}

/// Name the injection techniques that `input` resembles, in a fixed order
#[must_use]
pub fn injection_markers(input: &str) -> Vec<InjectionMarker> {
    let upper = input.to_uppercase();
    let compact: String = upper.chars().filter(|c| !c.is_whitespace()).collect();
    let mut markers = Vec::new();

    if input.contains('\'') && (compact.contains("OR'1'='1") || compact.contains("OR1=1")) {
        markers.push(InjectionMarker::Tautology);
    }
    if upper.contains("UNION") && upper.contains("SELECT") {
        markers.push(InjectionMarker::Union);
    }
    if input.contains("--") || input.contains("/*") {
        markers.push(InjectionMarker::Comment);
    }
    if input.contains(';') {
        markers.push(InjectionMarker::StackedStatement);
    }
    if upper.contains("PG_SLEEP") || upper.contains("SLEEP(") || upper.contains("WAITFOR DELAY") {
        markers.push(InjectionMarker::TimeDelay);
    }
    if upper.contains("CAST(") || compact.contains("::INT") {
        markers.push(InjectionMarker::CastError);
    }

    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_preprocess_empty_query() {
        let err = preprocess_sql("   ").unwrap_err();
        assert!(err.message().contains("Query cannot be empty"));
        assert!(preprocess_sql("-- only a comment").is_err());
    }

    #[test]
    fn test_preprocess_block_and_line_comments() {
        let result = preprocess_sql("SELECT * /* all */ FROM books -- trailing\n").unwrap();
        assert!(result.contains("FROM BOOKS"));
        assert!(!result.contains("ALL"));
        assert!(!result.contains("TRAILING"));
    }

    #[test]
    fn test_comment_markers_inside_literals_are_kept() {
        let result = preprocess_sql("SELECT '--not a comment' AS s").unwrap();
        assert!(result.contains("--NOT A COMMENT"));
    }

    #[test]
    fn test_select_and_cte_allowed() {
        assert!(validate_read_only("select * from books").is_ok());
        assert!(validate_read_only("SELECT 1;").is_ok());
        assert!(validate_read_only("WITH t AS (SELECT 1) SELECT * FROM t").is_ok());
        assert!(validate_read_only("EXPLAIN ANALYZE SELECT * FROM loans").is_ok());
        assert!(validate_read_only("SHOW server_version").is_ok());
    }

    #[test]
    fn test_writes_and_ddl_rejected() {
        for sql in [
            "INSERT INTO readers (full_name) VALUES ('x')",
            "UPDATE copies SET status = 'loaned'",
            "DELETE FROM loans",
            "DROP TABLE books",
            "TRUNCATE loans",
            "WITH gone AS (DELETE FROM loans RETURNING *) SELECT * FROM gone",
        ] {
            let err = validate_read_only(sql).unwrap_err();
            assert_eq!(err.error_code(), "UNSAFE_QUERY", "{sql}");
        }
    }

    #[test]
    fn test_stacked_statements_rejected() {
        let err = validate_read_only("SELECT * FROM books; DROP TABLE books;").unwrap_err();
        assert!(err.message().contains("Multiple statements"));
    }

    #[test]
    fn test_semicolon_inside_literal_allowed() {
        assert!(validate_read_only("SELECT * FROM books WHERE title = 'a;b'").is_ok());
    }

    #[test]
    fn test_quoted_identifiers_hide_semicolons_and_comments() {
        assert!(validate_read_only(r#"SELECT 1 AS "a;b""#).is_ok());
        assert!(validate_read_only(r#"SELECT 1 AS "it's""#).is_ok());
        assert!(
            validate_read_only(r#"SELECT "group" FROM readers WHERE full_name = 'say "hi"'"#)
                .is_ok()
        );

        let result = preprocess_sql(r#"SELECT 1 AS "--kept""#).unwrap();
        assert!(result.contains(r#""--KEPT""#));

        let err = validate_read_only(r#"SELECT "a"; DELETE FROM loans"#).unwrap_err();
        assert_eq!(err.error_code(), "UNSAFE_QUERY");
    }

    #[test]
    fn test_multiline_statements_allowed() {
        for sql in [
            "SELECT\n  title\nFROM books",
            "SELECT\ttitle FROM books",
            "WITH\nt AS (SELECT 1) SELECT * FROM t",
            "SELECT--c\n1",
            "SELECT/*c*/1",
            "\n  SHOW\n  server_version;\n",
            "EXPLAIN\nSELECT 1",
            "VALUES\n(1)",
        ] {
            assert!(validate_read_only(sql).is_ok(), "{sql:?}");
        }
    }

    #[test]
    fn test_multiline_writes_still_rejected() {
        for sql in [
            "DELETE\nFROM loans",
            "WITH gone AS (\n  DELETE\n  FROM loans RETURNING *\n) SELECT * FROM gone",
            "EXPLAIN ANALYZE\nUPDATE copies SET status = 'loaned'",
            "SELECTX 1",
        ] {
            let err = validate_read_only(sql).unwrap_err();
            assert_eq!(err.error_code(), "UNSAFE_QUERY", "{sql:?}");
        }
    }

    #[test]
    fn test_spliced_search_injection_still_read_only() {
        let spliced = "SELECT * FROM books WHERE title LIKE '%%' OR '1'='1%'";
        assert!(validate_read_only(spliced).is_ok());
    }

    #[test]
    fn test_markers_for_each_technique() {
        assert_eq!(injection_markers("any' OR '1'='1"), vec![InjectionMarker::Tautology]);
        assert_eq!(
            injection_markers("1 UNION SELECT full_name, 0 FROM readers"),
            vec![InjectionMarker::Union]
        );
        assert_eq!(
            injection_markers("test' AND (SELECT pg_sleep(5))--"),
            vec![InjectionMarker::Comment, InjectionMarker::TimeDelay]
        );
        assert_eq!(
            injection_markers("1 AND 1=CAST((SELECT version()) AS INT)"),
            vec![InjectionMarker::CastError]
        );
        assert_eq!(
            injection_markers("1; DROP TABLE loans"),
            vec![InjectionMarker::StackedStatement]
        );
    }

    #[test]
    fn test_benign_input_has_no_markers() {
        assert!(injection_markers("Война и мир").is_empty());
        assert!(injection_markers("O'Reilly").is_empty());
    }
}
