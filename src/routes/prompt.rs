use axum::{extract::State, Json};
use serde::Deserialize;

use super::auth::AuthenticatedUser;
use crate::error::{AppError, Result};
use crate::pipeline::PipelineResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Run the prompt-to-post pipeline
///
/// Any stage failure answers 400 with the failing stage named. The pipeline
/// is not transactional: a publish failure still consumed the query.
pub async fn process_prompt(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<PromptRequest>,
) -> Result<Json<PipelineResult>> {
    let prompt = payload.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::InvalidInput("Prompt must not be empty".to_string()));
    }

    tracing::info!("Pipeline requested by {}", user.username);

    let result = state.pipeline.run(prompt).await?;
    Ok(Json(result))
}
