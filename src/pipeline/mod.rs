//! Prompt-to-post pipeline
//!
//! A natural-language request is turned into SQL, screened, executed against
//! the historical post store, summarized into a short post and published to
//! the feed. Stages run strictly in order; the first failure ends the run and
//! is reported with the stage that produced it. Nothing is rolled back: a
//! publish failure leaves the read side's work spent.

pub mod completion;
pub mod executor;
pub mod generator;
pub mod publisher;
pub mod sanitizer;
pub mod summarizer;

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::SqlGuard;
use crate::models::Row;

pub use completion::{ChatCompletionClient, CompletionService};
pub use executor::{PgQueryExecutor, QueryExecutor};
pub use generator::QueryGenerator;
pub use publisher::{HttpPublisher, PostPublisher};
pub use sanitizer::{QuerySanitizer, SanitizedQuery};
pub use summarizer::PostSummarizer;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Generating,
    Sanitizing,
    Executing,
    Summarizing,
    Publishing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Generating => "Generating",
            Stage::Sanitizing => "Sanitizing",
            Stage::Executing => "Executing",
            Stage::Summarizing => "Summarizing",
            Stage::Publishing => "Publishing",
        };
        f.write_str(name)
    }
}

/// Failure reported by a single pipeline component
#[derive(Debug, Error)]
pub enum StageError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("query validation failed: {0}")]
    Validation(String),

    #[error("query execution failed: {0}")]
    Execution(String),

    #[error("publish failed: {0}")]
    Publish(String),
}

impl StageError {
    /// Attach the stage the error surfaced in
    pub fn at(self, stage: Stage) -> PipelineError {
        PipelineError {
            stage,
            source: self,
        }
    }
}

/// First failure of a pipeline run, tagged with its stage
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

/// Everything a successful run produced
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub sql_query: String,
    pub data: Vec<Row>,
    pub generated_post: String,
    pub post_result: Value,
}

/// Drives generate, sanitize, execute, summarize, publish in sequence
pub struct PipelineCoordinator {
    generator: QueryGenerator,
    sanitizer: QuerySanitizer,
    executor: Arc<dyn QueryExecutor>,
    summarizer: PostSummarizer,
    publisher: Arc<dyn PostPublisher>,
    acting_username: String,
}

impl PipelineCoordinator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        executor: Arc<dyn QueryExecutor>,
        publisher: Arc<dyn PostPublisher>,
        guard: SqlGuard,
        acting_username: String,
    ) -> Self {
        Self {
            generator: QueryGenerator::new(completion.clone()),
            sanitizer: QuerySanitizer::new(guard),
            executor,
            summarizer: PostSummarizer::new(completion),
            publisher,
            acting_username,
        }
    }

    /// Run the whole pipeline for one request
    pub async fn run(&self, request: &str) -> Result<PipelineResult, PipelineError> {
        tracing::info!(stage = %Stage::Generating, "Pipeline started");
        let raw_sql = self
            .generator
            .generate(request)
            .await
            .map_err(|e| e.at(Stage::Generating))?;

        tracing::info!(stage = %Stage::Sanitizing, "Pipeline advanced");
        let query = self
            .sanitizer
            .sanitize(&raw_sql)
            .map_err(|e| e.at(Stage::Sanitizing))?;

        tracing::info!(stage = %Stage::Executing, "Pipeline advanced");
        let rows = self
            .executor
            .execute(&query)
            .await
            .map_err(|e| e.at(Stage::Executing))?;

        tracing::info!(stage = %Stage::Summarizing, "Pipeline advanced");
        let post_text = self
            .summarizer
            .summarize(&rows, request)
            .await
            .map_err(|e| e.at(Stage::Summarizing))?;

        tracing::info!(stage = %Stage::Publishing, "Pipeline advanced");
        let outcome = self
            .publisher
            .publish(&self.acting_username, &post_text)
            .await
            .map_err(|e| e.at(Stage::Publishing))?;

        tracing::info!("Pipeline done");

        Ok(PipelineResult {
            sql_query: query.into_inner(),
            data: rows,
            generated_post: post_text,
            post_result: outcome,
        })
    }
}
