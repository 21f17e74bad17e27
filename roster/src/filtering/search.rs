use sea_orm::sea_query::{Expr, SimpleExpr};

/// Longest search term, in characters, that reaches a `LIKE` pattern
const MAX_SEARCH_QUERY_LENGTH: usize = 255;

/// Escape character declared in every `LIKE ... ESCAPE` this module builds
pub const LIKE_ESCAPE: char = '\\';

/// Escape LIKE wildcards so a search term only ever matches literally
/// Escapes: % (match any) and _ (match single char)
#[must_use]
pub fn escape_like_wildcards(input: &str) -> String {
    input.replace('\\', "\\\\")  // Escape backslash first
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `%term%` for a substring match.
///
/// The term is trimmed, capped in length and escaped. Case is left alone: both sides
/// of the comparison are folded by the database's own `UPPER`, so they always agree.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    let trimmed = term.trim();
    let capped: String = trimmed.chars().take(MAX_SEARCH_QUERY_LENGTH).collect();
    format!("%{}%", escape_like_wildcards(&capped))
}

/// `UPPER(expr) LIKE UPPER(pattern) ESCAPE '\'`
#[must_use]
pub fn upper_like(expr: impl Into<SimpleExpr>, pattern: &str) -> SimpleExpr {
    Expr::cust_with_exprs(
        "UPPER(?) LIKE UPPER(?) ESCAPE '\\'",
        [expr.into(), Expr::val(pattern).into()],
    )
}

/// `UPPER(a || ' ' || b) LIKE UPPER(pattern) ESCAPE '\'` for two already-quoted column references
#[must_use]
pub fn upper_concat_like(left: &str, right: &str, pattern: &str) -> SimpleExpr {
    Expr::cust_with_values(
        format!("UPPER({left} || ' ' || {right}) LIKE UPPER(?) ESCAPE '\\'"),
        [pattern.to_string()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{Alias, Query, SqliteQueryBuilder};

    fn where_sql(condition: SimpleExpr) -> String {
        Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("users"))
            .and_where(condition)
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_wildcard_escaping() {
        assert_eq!(escape_like_wildcards("test"), "test", "Normal text should pass through");
        assert_eq!(escape_like_wildcards("test%"), "test\\%", "% should be escaped");
        assert_eq!(escape_like_wildcards("test_value"), "test\\_value", "_ should be escaped");
        assert_eq!(escape_like_wildcards("%_"), "\\%\\_", "Both wildcards should be escaped");
        assert_eq!(escape_like_wildcards("\\"), "\\\\", "Backslash should be escaped");
        assert_eq!(escape_like_wildcards("\\%"), "\\\\\\%", "Backslash and % should both be escaped");
    }

    #[test]
    fn test_contains_pattern_keeps_case_and_wraps() {
        assert_eq!(contains_pattern("  Duilio "), "%Duilio%");
        assert_eq!(contains_pattern("pérez"), "%pérez%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
    }

    /// Test that excessively long terms are capped
    #[test]
    fn test_contains_pattern_length_limit() {
        let pattern = contains_pattern(&"a".repeat(20_000));
        assert_eq!(pattern.len(), MAX_SEARCH_QUERY_LENGTH + 2);
    }

    #[test]
    fn test_upper_like_folds_both_sides() {
        let sql = where_sql(upper_like(Expr::col(Alias::new("email")), "%styde%"));
        assert!(sql.contains(r#"UPPER("email") LIKE UPPER('%styde%') ESCAPE"#), "{sql}");
    }

    /// Values are bound, never spliced into the statement text
    #[test]
    fn test_upper_concat_like_binds_pattern() {
        let expr = upper_concat_like(
            r#""users"."first_name""#,
            r#""users"."last_name""#,
            &contains_pattern("' OR '1'='1"),
        );
        let (sql, values) = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("users"))
            .and_where(expr)
            .build(SqliteQueryBuilder);
        assert!(
            sql.contains(r#"UPPER("users"."first_name" || ' ' || "users"."last_name") LIKE UPPER(?)"#),
            "{sql}"
        );
        assert!(!sql.contains("OR '1'"), "{sql}");
        assert_eq!(values.0.len(), 1);
    }
}
