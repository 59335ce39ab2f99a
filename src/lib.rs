//! Postfeed Server Library
//!
//! A small social feed API (register, post, paginated feed) plus a pipeline
//! that turns a natural-language prompt into a query over historical posts,
//! summarizes the results and publishes the summary back to the feed.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod security;

pub use config::Config;
pub use db::{CredentialStore, MemoryStore, PgStore, PostStore};
pub use error::{AppError, Result};
pub use pipeline::PipelineCoordinator;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub posts: Arc<dyn PostStore>,
    pub pipeline: Arc<PipelineCoordinator>,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState from its stores, pipeline and configuration
    pub fn new(
        users: Arc<dyn CredentialStore>,
        posts: Arc<dyn PostStore>,
        pipeline: Arc<PipelineCoordinator>,
        config: Config,
    ) -> Self {
        Self {
            users,
            posts,
            pipeline,
            config,
        }
    }
}

/// Build the router with every endpoint and request tracing
pub fn create_router(state: AppState) -> Router {
    use routes::*;

    Router::new()
        .route("/health", get(health_check))
        .route("/create_user", post(register_user))
        .route("/post_tweet", post(create_post))
        .route("/tweets", get(list_posts))
        .route("/tweet/:id", get(get_post).delete(delete_post))
        .route("/process-prompt", post(process_prompt))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
