use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_PLACEHOLDER_LIKES, MAX_PLACEHOLDER_REPLIES, MAX_PLACEHOLDER_RETWEETS,
    MAX_POST_TEXT_CHARS,
};

/// A published post
///
/// Field names on the wire follow the feed client's format
/// (`username`, `content`, `isLiked`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    #[serde(rename = "username")]
    pub author: String,
    pub handle: String,
    #[serde(rename = "content")]
    pub text: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub likes: i32,
    pub retweets: i32,
    pub replies: i32,
    #[serde(rename = "isLiked")]
    pub liked: bool,
    #[serde(rename = "isRetweeted")]
    pub retweeted: bool,
}

impl Post {
    /// Build a new post with a random id and placeholder engagement
    ///
    /// Engagement counters are not tracked; they are drawn at random so the
    /// feed has something to render.
    pub fn new(author: &str, text: &str) -> Self {
        let mut rng = rand::thread_rng();

        Self {
            id: random_post_id(),
            author: author.to_string(),
            handle: display_handle(author),
            text: text.to_string(),
            created_at: Utc::now(),
            likes: rng.gen_range(0..=MAX_PLACEHOLDER_LIKES),
            retweets: rng.gen_range(0..=MAX_PLACEHOLDER_RETWEETS),
            replies: rng.gen_range(0..=MAX_PLACEHOLDER_REPLIES),
            liked: rng.gen_bool(0.5),
            retweeted: rng.gen_bool(0.5),
        }
    }

    /// Draw a different id after a collision
    pub fn reroll_id(&mut self) {
        self.id = random_post_id();
    }

    /// Validate post text: non-blank and at most MAX_POST_TEXT_CHARS
    pub fn validate_text(text: &str) -> bool {
        !text.trim().is_empty() && text.chars().count() <= MAX_POST_TEXT_CHARS
    }
}

/// Top 32 bits of a random 128-bit value
///
/// Not unique by construction; stores reject duplicates and callers reroll.
pub fn random_post_id() -> i64 {
    (rand::random::<u128>() >> 96) as i64
}

/// "@" followed by the lowercased author name
pub fn display_handle(author: &str) -> String {
    format!("@{}", author.to_lowercase())
}
