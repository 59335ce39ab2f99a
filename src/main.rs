use axum::http::{HeaderValue, Method};
use secrecy::SecretString;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postfeed_server::config::StoreBackend;
use postfeed_server::db::{create_pool, pool::run_migrations};
use postfeed_server::pipeline::{ChatCompletionClient, HttpPublisher, PgQueryExecutor};
use postfeed_server::{
    create_router, AppState, Config, CredentialStore, MemoryStore, PgStore, PipelineCoordinator,
    PostStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postfeed_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Postfeed Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}, Store: {:?}, SQL guard: {:?}",
        config.environment,
        config.server_address(),
        config.store_backend,
        config.sql_guard
    );

    // Users and posts for the CRUD endpoints
    let (users, posts): (Arc<dyn CredentialStore>, Arc<dyn PostStore>) =
        match config.store_backend {
            StoreBackend::Postgres => {
                let pool = create_pool(&config.database_url).await?;
                run_migrations(&pool).await?;
                let store = Arc::new(PgStore::new(pool));
                let users: Arc<dyn CredentialStore> = store.clone();
                (users, store as Arc<dyn PostStore>)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                let users: Arc<dyn CredentialStore> = store.clone();
                (users, store as Arc<dyn PostStore>)
            }
        };

    // Prompt-to-post pipeline
    let completion = Arc::new(ChatCompletionClient::new(
        SecretString::from(config.completion_api_key.clone()),
        config.completion_base_url.clone(),
        config.completion_model.clone(),
    ));
    let executor = Arc::new(PgQueryExecutor::new(config.posts_database_url.clone()));
    let publisher = Arc::new(HttpPublisher::new(
        config.publish_endpoint.clone(),
        SecretString::from(config.publish_api_key.clone()),
    ));
    let pipeline = Arc::new(PipelineCoordinator::new(
        completion,
        executor,
        publisher,
        config.sql_guard,
        config.publish_username.clone(),
    ));

    // Configure CORS
    let origins = config
        .allowed_origins
        .iter()
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let addr: SocketAddr = config.server_address().parse()?;
    let state = AppState::new(users, posts, pipeline, config);
    let app = create_router(state).layer(cors);

    // Start server
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
