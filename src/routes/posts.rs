use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::auth::AuthenticatedUser;
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_POST_ID_ATTEMPTS, MAX_POST_TEXT_CHARS};
use crate::error::{AppError, Result};
use crate::models::Post;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub username: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PostActionResponse {
    pub status: &'static str,
    pub data: PostActionData,
}

#[derive(Debug, Serialize)]
pub struct PostActionData {
    pub message: &'static str,
    pub tweet_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub status: bool,
    pub count: usize,
    pub data: Vec<Post>,
}

/// Publish a post as the key's owner
///
/// The declared username must match the key's owner (403). The store charges
/// the usage quota and writes the post together: a user at the limit gets 429
/// and no post, and a failed write leaves the quota untouched. Colliding
/// random ids are redrawn a few times.
pub async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<PostActionResponse>> {
    if payload.username != user.username {
        tracing::warn!(
            "Key owner {} tried to post as {}",
            user.username,
            payload.username
        );
        return Err(AppError::UsernameMismatch);
    }

    if !Post::validate_text(&payload.text) {
        return Err(AppError::InvalidInput(format!(
            "Text must be 1-{} characters",
            MAX_POST_TEXT_CHARS
        )));
    }

    let mut post = Post::new(&user.username, &payload.text);
    let mut attempt = 1;
    let usage = loop {
        match state.posts.insert_post(&post).await {
            Ok(usage) => break usage,
            Err(AppError::PostIdTaken) if attempt < MAX_POST_ID_ATTEMPTS => {
                tracing::warn!("Post id {} already taken, drawing another", post.id);
                post.reroll_id();
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    };

    tracing::info!(
        "Post {} created by {} ({}/{})",
        post.id,
        user.username,
        usage,
        user.usage_limit
    );

    Ok(Json(PostActionResponse {
        status: "success",
        data: PostActionData {
            message: "Tweet posted",
            tweet_id: post.id,
        },
    }))
}

/// Newest-first page of the feed
///
/// `page` starts at 1 and `limit` is 1-100. A store failure still answers
/// with the usual shape and an empty page.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<(StatusCode, Json<FeedResponse>)> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err(AppError::InvalidInput("page must be at least 1".to_string()));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    match state.posts.list_posts(page, limit).await {
        Ok(posts) => Ok((
            StatusCode::OK,
            Json(FeedResponse {
                status: true,
                count: posts.len(),
                data: posts,
            }),
        )),
        Err(e) => {
            tracing::error!("Failed to list posts: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FeedResponse {
                    status: false,
                    count: 0,
                    data: Vec::new(),
                }),
            ))
        }
    }
}

/// Fetch one post; any valid key may read
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<Json<Post>> {
    let post = state
        .posts
        .get_post(id)
        .await?
        .ok_or(AppError::PostNotFound)?;

    Ok(Json(post))
}

/// Delete a post owned by the key's user
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<PostActionResponse>> {
    let post = state
        .posts
        .get_post(id)
        .await?
        .ok_or(AppError::PostNotFound)?;

    if post.author != user.username {
        tracing::warn!("{} tried to delete post {} by {}", user.username, id, post.author);
        return Err(AppError::NotPostOwner);
    }

    if !state.posts.delete_post(id).await? {
        return Err(AppError::PostNotFound);
    }

    tracing::info!("Post {} deleted by {}", id, user.username);

    Ok(Json(PostActionResponse {
        status: "success",
        data: PostActionData {
            message: "Tweet deleted",
            tweet_id: id,
        },
    }))
}
