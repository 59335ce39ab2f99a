//! Persistence ports for the CRUD surface and their implementations.

pub mod memory;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Post, User};

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use postgres::PgStore;

/// Users, their key fingerprints and posting quota
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user; Err(UserAlreadyExists) if the username is taken
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn find_by_key_hash(&self, api_key_hash: &str) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Feed posts
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a post and charge one unit of its author's quota, atomically
    ///
    /// Returns the author's new usage count. Fails with Err(RateLimitExceeded)
    /// once the limit is reached, or Err(PostIdTaken) if the id already
    /// exists. On any error neither the post nor the quota change persists.
    async fn insert_post(&self, post: &Post) -> Result<i32>;

    /// Page of posts, newest first. `page` is 1-based.
    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<Post>>;

    async fn get_post(&self, id: i64) -> Result<Option<Post>>;

    /// Delete a post, returning whether it existed
    async fn delete_post(&self, id: i64) -> Result<bool>;

    /// Cheap connectivity check for the health endpoint
    async fn ping(&self) -> bool;
}

/// Row offset of a 1-based page
pub(crate) fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(limit)
}
