//! PostgreSQL-backed tests for the store and the query executor
//!
//! These need a scratch database and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/postfeed_test cargo test -- --ignored
//! ```

use serde_json::json;
use sqlx::PgPool;

use postfeed_server::config::SqlGuard;
use postfeed_server::db::pool::{create_pool, run_migrations};
use postfeed_server::models::{Post, User};
use postfeed_server::pipeline::{PgQueryExecutor, QueryExecutor, QuerySanitizer, StageError};
use postfeed_server::security::generate_api_key;
use postfeed_server::{AppError, CredentialStore, PgStore, PostStore};

// =============================================================================
// Test Helpers
// =============================================================================

/// Migrated pool, or None when no database is configured
async fn migrated_pool() -> Option<(String, PgPool)> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = create_pool(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Some((url, pool))
}

/// Register a user with a name no other run will reuse
async fn register(store: &PgStore, limit: i32) -> String {
    let username = format!("pg_{}", &generate_api_key()[..12]);
    let user = User::new(username.clone(), generate_api_key(), limit);
    store.insert_user(&user).await.unwrap();
    username
}

async fn usage_count(store: &PgStore, username: &str) -> i32 {
    store
        .find_by_username(username)
        .await
        .unwrap()
        .unwrap()
        .usage_count
}

// =============================================================================
// Store Tests
// =============================================================================

#[tokio::test]
#[ignore]
async fn test_duplicate_username_conflicts() {
    let Some((_, pool)) = migrated_pool().await else {
        return;
    };
    let store = PgStore::new(pool);
    let username = register(&store, 5).await;

    let again = User::new(username, generate_api_key(), 5);
    assert!(matches!(
        store.insert_user(&again).await,
        Err(AppError::UserAlreadyExists)
    ));
}

#[tokio::test]
#[ignore]
async fn test_insert_post_stops_at_limit() {
    let Some((_, pool)) = migrated_pool().await else {
        return;
    };
    let store = PgStore::new(pool);
    let username = register(&store, 2).await;

    assert_eq!(store.insert_post(&Post::new(&username, "one")).await.unwrap(), 1);
    assert_eq!(store.insert_post(&Post::new(&username, "two")).await.unwrap(), 2);

    let over = Post::new(&username, "three");
    assert!(matches!(
        store.insert_post(&over).await,
        Err(AppError::RateLimitExceeded)
    ));
    assert!(store.get_post(over.id).await.unwrap().is_none());
    assert_eq!(usage_count(&store, &username).await, 2);
}

#[tokio::test]
#[ignore]
async fn test_post_id_collision_rolls_back_quota() {
    let Some((_, pool)) = migrated_pool().await else {
        return;
    };
    let store = PgStore::new(pool);
    let username = register(&store, 5).await;

    let post = Post::new(&username, "first");
    store.insert_post(&post).await.unwrap();

    let mut clash = Post::new(&username, "second");
    clash.id = post.id;
    assert!(matches!(
        store.insert_post(&clash).await,
        Err(AppError::PostIdTaken)
    ));

    assert_eq!(usage_count(&store, &username).await, 1);
    assert_eq!(store.get_post(post.id).await.unwrap().unwrap().text, "first");

    assert!(store.delete_post(post.id).await.unwrap());
    assert!(!store.delete_post(post.id).await.unwrap());
}

// =============================================================================
// Executor Tests
// =============================================================================

#[tokio::test]
#[ignore]
async fn test_generated_query_reads_feed_posts() {
    let Some((url, pool)) = migrated_pool().await else {
        return;
    };
    let store = PgStore::new(pool);
    let username = register(&store, 5).await;

    let mut quiet = Post::new(&username, "quiet post");
    quiet.likes = 3;
    let mut popular = Post::new(&username, "popular post");
    popular.likes = 900;
    store.insert_post(&quiet).await.unwrap();
    store.insert_post(&popular).await.unwrap();

    let raw = format!(
        "```sql\nSELECT text, likes FROM tweets\nWHERE author = '{}'\nORDER BY likes DESC LIMIT 5;\n```",
        username
    );
    let query = QuerySanitizer::new(SqlGuard::SelectOnly)
        .sanitize(&raw)
        .unwrap();
    let rows = PgQueryExecutor::new(url).execute(&query).await.unwrap();

    assert_eq!(
        serde_json::to_value(&rows).unwrap(),
        json!([
            { "text": "popular post", "likes": 900 },
            { "text": "quiet post", "likes": 3 },
        ])
    );
}

#[tokio::test]
#[ignore]
async fn test_tweets_view_columns() {
    let Some((url, pool)) = migrated_pool().await else {
        return;
    };
    let store = PgStore::new(pool);
    let username = register(&store, 5).await;
    let post = Post::new(&username, "shape check");
    store.insert_post(&post).await.unwrap();

    let query = QuerySanitizer::new(SqlGuard::SelectOnly)
        .sanitize(&format!("SELECT * FROM tweets WHERE id = {}", post.id))
        .unwrap();
    let rows = PgQueryExecutor::new(url).execute(&query).await.unwrap();

    let json = serde_json::to_string(&rows).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let row = &value[0];
    assert_eq!(row["id"], post.id);
    assert_eq!(row["author"], username.as_str());
    assert!(row["embedding"].is_null());
    assert!(row["timestamp"].is_string());

    // Columns keep the view's order
    let order = ["id", "author", "text", "embedding", "retweets", "likes", "timestamp"];
    let positions: Vec<usize> = order
        .iter()
        .map(|c| json.find(&format!("\"{}\":", c)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
#[ignore]
async fn test_undecodable_value_fails_execution() {
    let Some((url, _)) = migrated_pool().await else {
        return;
    };

    // rust_decimal has no NaN
    let query = QuerySanitizer::new(SqlGuard::SelectOnly)
        .sanitize("SELECT 'NaN'::numeric AS n")
        .unwrap();
    let result = PgQueryExecutor::new(url).execute(&query).await;

    assert!(matches!(result, Err(StageError::Execution(_))));
}

#[tokio::test]
#[ignore]
async fn test_executor_is_read_only() {
    let Some((url, _)) = migrated_pool().await else {
        return;
    };

    // Passes the denylist guard but must still be refused by the transaction
    let query = QuerySanitizer::new(SqlGuard::Denylist)
        .sanitize("CREATE TABLE should_not_exist (id INT)")
        .unwrap();
    let result = PgQueryExecutor::new(url).execute(&query).await;

    assert!(matches!(result, Err(StageError::Execution(_))));
}
