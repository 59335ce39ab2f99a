use std::sync::Arc;

use super::completion::CompletionService;
use super::StageError;
use crate::constants::{MAX_SUMMARY_WORDS, TRUNCATION_SUFFIX};
use crate::models::Row;

/// Writes a short publishable post from query results
pub struct PostSummarizer {
    completion: Arc<dyn CompletionService>,
}

impl PostSummarizer {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn summarize(&self, rows: &[Row], request: &str) -> Result<String, StageError> {
        let data = serde_json::to_string(rows)
            .map_err(|e| StageError::Generation(format!("failed to encode rows: {}", e)))?;
        let prompt = build_summary_prompt(request, &data);

        let text = self.completion.complete(&prompt).await?;
        if text.trim().is_empty() {
            return Err(StageError::Generation("no post text was generated".to_string()));
        }

        Ok(truncate_words(&text, MAX_SUMMARY_WORDS))
    }
}

pub fn build_summary_prompt(request: &str, data: &str) -> String {
    format!(
        "Create a tweet (max {max} words) from this data:
Prompt: {request}
Data: {data}
Rules: Be concise, engaging, use hashtags if relevant.",
        max = MAX_SUMMARY_WORDS,
        request = request,
        data = data,
    )
}

/// Cut text to its first `max_words` words plus an ellipsis
///
/// Text at or under the limit is returned unchanged, whitespace included.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }

    format!("{}{}", words[..max_words].join(" "), TRUNCATION_SUFFIX)
}
