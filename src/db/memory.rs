use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{page_offset, CredentialStore, PostStore};
use crate::error::{AppError, Result};
use crate::models::{Post, User};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    posts: HashMap<i64, Post>,
}

/// Process-local store for development and tests
///
/// Every operation takes the single lock, so check-then-write sequences are
/// atomic with respect to each other.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.username) {
            tracing::info!("Username already exists: {}", user.username);
            return Err(AppError::UserAlreadyExists);
        }
        inner.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn find_by_key_hash(&self, api_key_hash: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.api_key_hash == api_key_hash)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(username).cloned())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: &Post) -> Result<i32> {
        let mut guard = self.inner.write().await;
        let Inner { users, posts } = &mut *guard;

        if posts.contains_key(&post.id) {
            return Err(AppError::PostIdTaken);
        }

        let author = users
            .get_mut(&post.author)
            .ok_or(AppError::InvalidApiKey)?;
        author.consume_quota()?;

        posts.insert(post.id, post.clone());
        Ok(author.usage_count)
    }

    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<&Post> = inner.posts.values().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(page_offset(page, limit)).unwrap_or(usize::MAX);
        Ok(posts
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.get(&id).cloned())
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.posts.remove(&id).is_some())
    }

    async fn ping(&self) -> bool {
        true
    }
}
