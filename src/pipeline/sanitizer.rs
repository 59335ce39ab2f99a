//! Screening of generated SQL before it reaches the database.
//!
//! The denylist is a known-weak filter: it does not catch `INSERT`, encoded
//! keywords, or a destructive first statement that avoids the listed words.
//! `SqlGuard::SelectOnly` adds a leading-keyword allow-list on top, and the
//! executor runs every statement in a read-only transaction regardless.

use super::StageError;
use crate::config::SqlGuard;

/// Substrings that reject a statement, matched case-insensitively
pub const DENYLIST: [&str; 8] = [
    ";--",
    ";/*",
    ";*/",
    "UNION ALL",
    "UNION SELECT",
    "DROP",
    "DELETE",
    "UPDATE",
];

/// Leading keywords accepted under `SqlGuard::SelectOnly`
const ALLOWED_LEADING_KEYWORDS: [&str; 2] = ["SELECT", "WITH"];

/// A statement that has passed the sanitizer
///
/// Only `QuerySanitizer::sanitize` produces one, so executors never see raw
/// model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedQuery(String);

impl SanitizedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QuerySanitizer {
    guard: SqlGuard,
}

impl QuerySanitizer {
    pub fn new(guard: SqlGuard) -> Self {
        Self { guard }
    }

    /// Normalize a generated statement and screen it
    pub fn sanitize(&self, raw: &str) -> Result<SanitizedQuery, StageError> {
        let statement = normalize(raw);

        if let Some(pattern) = find_denied(&statement) {
            tracing::warn!("Rejected generated SQL containing {:?}", pattern);
            return Err(StageError::Validation(format!(
                "potentially unsafe query detected (contains {:?})",
                pattern
            )));
        }

        if self.guard == SqlGuard::SelectOnly && !starts_with_read_keyword(&statement) {
            tracing::warn!("Rejected generated SQL that is not a SELECT");
            return Err(StageError::Validation(
                "only SELECT statements may be executed".to_string(),
            ));
        }

        Ok(SanitizedQuery(statement))
    }
}

/// Strip code fences, keep only the first statement, collapse whitespace
///
/// Everything after the first `;` is dropped, including legitimate trailing
/// content, and exactly one `;` is re-appended.
pub fn normalize(raw: &str) -> String {
    let unfenced = raw.replace("```sql", "").replace("```", "");
    let first = unfenced.split(';').next().unwrap_or_default();
    let terminated = format!("{};", first);
    terminated.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_denied(statement: &str) -> Option<&'static str> {
    let upper = statement.to_uppercase();
    DENYLIST.iter().copied().find(|pattern| upper.contains(pattern))
}

fn starts_with_read_keyword(statement: &str) -> bool {
    let body = statement.trim_start_matches(|c: char| c == '(' || c.is_whitespace());
    let keyword: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();
    ALLOWED_LEADING_KEYWORDS.contains(&keyword.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denylist() -> QuerySanitizer {
        QuerySanitizer::new(SqlGuard::Denylist)
    }

    fn select_only() -> QuerySanitizer {
        QuerySanitizer::new(SqlGuard::SelectOnly)
    }

    #[test]
    fn test_strips_fences_and_collapses_whitespace() {
        let raw = "```sql\nSELECT text\n   FROM tweets\n\tORDER BY likes DESC\nLIMIT 5;\n```";
        let query = select_only().sanitize(raw).unwrap();

        assert_eq!(
            query.as_str(),
            "SELECT text FROM tweets ORDER BY likes DESC LIMIT 5;"
        );
    }

    #[test]
    fn test_appends_missing_terminator() {
        let query = denylist().sanitize("SELECT * FROM tweets").unwrap();
        assert_eq!(query.as_str(), "SELECT * FROM tweets;");
    }

    #[test]
    fn test_drop_statement_rejected() {
        for sanitizer in [denylist(), select_only()] {
            assert!(matches!(
                sanitizer.sanitize("DROP TABLE tweets;"),
                Err(StageError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_trailing_statement_truncated_before_check() {
        // Truncation runs first, so the injected DROP never reaches the denylist
        for sanitizer in [denylist(), select_only()] {
            let query = sanitizer
                .sanitize("SELECT * FROM tweets; DROP TABLE tweets;")
                .unwrap();
            assert_eq!(query.as_str(), "SELECT * FROM tweets;");
        }
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        for raw in [
            "delete from tweets;",
            "Update tweets SET likes = 0;",
            "SELECT text FROM tweets union all SELECT text FROM tweets;",
            "SELECT text FROM tweets UNION   SELECT author FROM tweets;",
        ] {
            assert!(
                matches!(denylist().sanitize(raw), Err(StageError::Validation(_))),
                "expected rejection for {}",
                raw
            );
        }
    }

    #[test]
    fn test_denylist_matches_inside_identifiers() {
        // Plain substring matching also hits column names like last_updated
        assert!(denylist()
            .sanitize("SELECT last_updated FROM tweets;")
            .is_err());
    }

    #[test]
    fn test_parenthesized_union_allowed() {
        let raw = "(SELECT text FROM tweets WHERE likes > 10) UNION (SELECT text FROM tweets WHERE retweets > 5);";
        assert!(select_only().sanitize(raw).is_ok());
    }

    #[test]
    fn test_insert_passes_denylist_but_not_select_only() {
        let raw = "INSERT INTO tweets (text) VALUES ('x');";

        assert!(denylist().sanitize(raw).is_ok());
        assert!(matches!(
            select_only().sanitize(raw),
            Err(StageError::Validation(_))
        ));
    }

    #[test]
    fn test_with_clause_allowed() {
        let raw = "WITH top AS (SELECT * FROM tweets ORDER BY likes DESC LIMIT 5) SELECT text FROM top;";
        assert!(select_only().sanitize(raw).is_ok());
    }

    #[test]
    fn test_empty_statement() {
        assert_eq!(normalize("```sql\n```"), ";");
        assert!(select_only().sanitize("").is_err());
    }
}
