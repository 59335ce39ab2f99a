use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_USERNAME_CHARS;
use crate::error::{AppError, Result};

/// Registered user as persisted by the credential store
///
/// The API key itself is never stored, only its fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub usage_count: i32,
    pub usage_limit: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a freshly registered user with an unused quota
    pub fn new(username: String, api_key_hash: String, usage_limit: i32) -> Self {
        Self {
            username,
            api_key_hash,
            usage_count: 0,
            usage_limit,
            created_at: Utc::now(),
        }
    }

    /// Validate a username: 1-32 ASCII letters, digits or underscores
    pub fn validate_username(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= MAX_USERNAME_CHARS
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Whether another post would stay within the usage limit
    pub fn has_quota(&self) -> bool {
        self.usage_count < self.usage_limit
    }

    /// Reserve one unit of quota
    ///
    /// Returns Err(RateLimitExceeded) without touching the counter once the
    /// limit is reached.
    pub fn consume_quota(&mut self) -> Result<()> {
        if !self.has_quota() {
            tracing::warn!(
                "Usage limit reached for {}: {}/{}",
                self.username,
                self.usage_count,
                self.usage_limit
            );
            return Err(AppError::RateLimitExceeded);
        }

        self.usage_count += 1;
        Ok(())
    }
}
