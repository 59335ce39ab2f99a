use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{
    ERR_INVALID_API_KEY, ERR_MISSING_API_KEY, ERR_NOT_POST_OWNER, ERR_USERNAME_MISMATCH,
};
use crate::pipeline::PipelineError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Username already exists")]
    UserAlreadyExists,

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key does not match username")]
    UsernameMismatch,

    #[error("API key does not own the post")]
    NotPostOwner,

    #[error("Post not found")]
    PostNotFound,

    #[error("Post id already taken")]
    PostIdTaken,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Usage limit exceeded")]
    RateLimitExceeded,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message): (StatusCode, String) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
            AppError::PostIdTaken => {
                tracing::error!("Exhausted post id attempts");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
            AppError::UserAlreadyExists => {
                (StatusCode::BAD_REQUEST, "Username already exists".into())
            }
            AppError::MissingApiKey => (StatusCode::UNAUTHORIZED, ERR_MISSING_API_KEY.into()),
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, ERR_INVALID_API_KEY.into()),
            AppError::UsernameMismatch => (StatusCode::FORBIDDEN, ERR_USERNAME_MISMATCH.into()),
            AppError::NotPostOwner => (StatusCode::FORBIDDEN, ERR_NOT_POST_OWNER.into()),
            AppError::PostNotFound => (StatusCode::NOT_FOUND, "Tweet not found".into()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Usage limit exceeded - no more posts allowed for this key".into(),
            ),
            AppError::Pipeline(e) => {
                tracing::warn!(stage = %e.stage, "Pipeline failed: {}", e);
                let body = Json(json!({
                    "error": e.to_string(),
                    "stage": e.stage.to_string(),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Stage, StageError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::UserAlreadyExists, StatusCode::BAD_REQUEST),
            (AppError::MissingApiKey, StatusCode::UNAUTHORIZED),
            (AppError::InvalidApiKey, StatusCode::UNAUTHORIZED),
            (AppError::UsernameMismatch, StatusCode::FORBIDDEN),
            (AppError::NotPostOwner, StatusCode::FORBIDDEN),
            (AppError::PostNotFound, StatusCode::NOT_FOUND),
            (AppError::RateLimitExceeded, StatusCode::TOO_MANY_REQUESTS),
            (AppError::PostIdTaken, StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::InvalidInput("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_pipeline_error_is_bad_request() {
        let error: AppError = StageError::Execution("syntax error".to_string())
            .at(Stage::Executing)
            .into();

        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
