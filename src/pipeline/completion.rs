//! Text-completion service client (OpenAI-compatible chat API)

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::StageError;

/// Black-box text completion: prompt in, generated text out
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete a prompt; empty output is an error
    async fn complete(&self, prompt: &str) -> Result<String, StageError>;
}

/// Client for any provider exposing `POST {base_url}/chat/completions`
pub struct ChatCompletionClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(api_key: SecretString, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, StageError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| StageError::Generation(format!("completion service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Generation(format!(
                "completion service returned {}: {}",
                status, body
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| StageError::Generation(format!("invalid completion response: {}", e)))?;

        let text = api_response
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(StageError::Generation(
                "completion service returned empty text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ChatCompletionClient {
        ChatCompletionClient::new(
            SecretString::from("test-key".to_string()),
            format!("{}/", server.uri()),
            "test-model".to_string(),
        )
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "messages": [{ "role": "user", "content": "say hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "hi" } }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let text = client_for(&mock_server).complete("say hi").await.unwrap();
        assert_eq!(text, "hi");
    }

    #[tokio::test]
    async fn test_complete_empty_text_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "   " } }]
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).complete("anything").await;
        assert!(matches!(result, Err(StageError::Generation(_))));
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        match client_for(&mock_server).complete("anything").await {
            Err(StageError::Generation(msg)) => assert!(msg.contains("500")),
            other => panic!("expected generation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_unreachable() {
        let client = ChatCompletionClient::new(
            SecretString::from("k".to_string()),
            "http://127.0.0.1:1".to_string(),
            "m".to_string(),
        );

        assert!(matches!(
            client.complete("anything").await,
            Err(StageError::Generation(_))
        ));
    }
}
