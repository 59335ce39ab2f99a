use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use super::StageError;
use crate::constants::PUBLISH_KEY_HEADER;

/// Delivers a finished post to the feed
#[async_trait]
pub trait PostPublisher: Send + Sync {
    /// Publish `text` as `username`, returning the feed's JSON response
    async fn publish(&self, username: &str, text: &str) -> Result<Value, StageError>;
}

/// Posts to the feed API's create endpoint with a fixed shared secret
pub struct HttpPublisher {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl HttpPublisher {
    pub fn new(endpoint: String, api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct CreatePostBody<'a> {
    username: &'a str,
    text: &'a str,
}

#[async_trait]
impl PostPublisher for HttpPublisher {
    async fn publish(&self, username: &str, text: &str) -> Result<Value, StageError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(PUBLISH_KEY_HEADER, self.api_key.expose_secret())
            .json(&CreatePostBody { username, text })
            .send()
            .await
            .map_err(|e| StageError::Publish(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Publish(format!(
                "feed returned {}: {}",
                status, body
            )));
        }

        let outcome: Value = response
            .json()
            .await
            .map_err(|e| StageError::Publish(format!("invalid response body: {}", e)))?;

        tracing::info!("Published generated post as {}", username);
        Ok(outcome)
    }
}
