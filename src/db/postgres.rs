use async_trait::async_trait;
use sqlx::PgPool;

use super::{page_offset, CredentialStore, PostStore};
use crate::error::{AppError, Result};
use crate::models::{Post, User};

/// Users and posts in PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO users (username, api_key_hash, usage_count, usage_limit, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(&user.username)
        .bind(&user.api_key_hash)
        .bind(user.usage_count)
        .bind(user.usage_limit)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::info!("Username already exists: {}", user.username);
            return Err(AppError::UserAlreadyExists);
        }

        Ok(())
    }

    async fn find_by_key_hash(&self, api_key_hash: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE api_key_hash = $1")
            .bind(api_key_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: &Post) -> Result<i32> {
        let mut tx = self.pool.begin().await?;

        // Check and increment in one statement so concurrent posts cannot overshoot
        let count: Option<i32> = sqlx::query_scalar(
            "UPDATE users SET usage_count = usage_count + 1
             WHERE username = $1 AND usage_count < usage_limit
             RETURNING usage_count",
        )
        .bind(&post.author)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(count) = count else {
            tracing::warn!("Usage limit reached for {}", post.author);
            return Err(AppError::RateLimitExceeded);
        };

        let result = sqlx::query(
            "INSERT INTO posts
                (id, author, handle, text, created_at, likes, retweets, replies, liked, retweeted)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(post.id)
        .bind(&post.author)
        .bind(&post.handle)
        .bind(&post.text)
        .bind(post.created_at)
        .bind(post.likes)
        .bind(post.retweets)
        .bind(post.replies)
        .bind(post.liked)
        .bind(post.retweeted)
        .execute(&mut *tx)
        .await?;

        // Dropping the transaction rolls back the usage increment
        if result.rows_affected() == 0 {
            return Err(AppError::PostIdTaken);
        }

        tx.commit().await?;

        Ok(count)
    }

    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(limit))
        .bind(page_offset(page, limit) as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Database health check failed: {:?}", e);
                false
            }
        }
    }
}
