use std::sync::Arc;

use super::completion::CompletionService;
use super::StageError;
use crate::constants::POSTS_SCHEMA_DESCRIPTION;

/// Turns a natural-language request into one SQL statement
///
/// Output is passed through untouched; dialect compliance is the
/// sanitizer's and the database's concern.
pub struct QueryGenerator {
    completion: Arc<dyn CompletionService>,
}

impl QueryGenerator {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn generate(&self, request: &str) -> Result<String, StageError> {
        let prompt = build_query_prompt(request);
        let sql = self.completion.complete(&prompt).await?;

        if sql.trim().is_empty() {
            return Err(StageError::Generation(
                "no SQL statement was generated".to_string(),
            ));
        }

        tracing::debug!("Generated SQL: {}", sql);
        Ok(sql)
    }
}

/// Prompt asking for a single PostgreSQL statement over the post schema
pub fn build_query_prompt(request: &str) -> String {
    format!(
        r#"Schema:
{schema}

Task: "{request}"

Rules:
1. Output ONLY the SQL query
2. Use PostgreSQL syntax
3. Use || for string concat
4. Use single % for LIKE
5. Use single quotes
6. Wrap UNION in parentheses
7. End with semicolon
8. No comments or explanations

Example: SELECT text FROM tweets WHERE likes > 100 ORDER BY timestamp DESC LIMIT 5;"#,
        schema = POSTS_SCHEMA_DESCRIPTION,
        request = request,
    )
}
