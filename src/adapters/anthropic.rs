//! Anthropic Messages API adapter.
//!
//! Implements [`LanguageModel`] over `POST {base_url}/messages`. The API
//! key is held in an [`ApiCredential`] and only exposed when the request
//! headers are built.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::embedding::retry_after;
use super::{AdapterError, ApiCredential, LanguageModel, RetryPolicy};
use crate::config::LlmSettings;

/// Environment variable holding the Anthropic API key
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude client
pub struct AnthropicClient {
    credential: ApiCredential,
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    retry: RetryPolicy,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AnthropicClient {
    /// Create a client with an explicit credential
    pub fn new(
        credential: ApiCredential,
        settings: &LlmSettings,
        retry: RetryPolicy,
    ) -> Result<Self, AdapterError> {
        let timeout = settings.timeout();
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            credential,
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout,
            retry,
        })
    }

    /// Create a client reading `ANTHROPIC_API_KEY`; a missing key is fatal
    pub fn from_env(settings: &LlmSettings, retry: RetryPolicy) -> Result<Self, AdapterError> {
        let credential = ApiCredential::from_env(ANTHROPIC_API_KEY_ENV, "Anthropic API key")?;
        Self::new(credential, settings, retry)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, prompt: &str, system: Option<&str>) -> Result<String, AdapterError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AdapterError::from_request(e, self.timeout))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AdapterError::RateLimited {
                retry_after: retry_after(&response),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(format!("messages body: {}", e)))?;

        let text = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(AdapterError::InvalidResponse(format!(
                "no text content (stop_reason: {})",
                body.stop_reason.as_deref().unwrap_or("none")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AdapterError> {
        let text = self
            .retry
            .run("anthropic", || self.send(prompt, system))
            .await?;
        debug!(
            response = %text.chars().take(100).collect::<String>(),
            "LLM generated response"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(base_url: String) -> AnthropicClient {
        let settings = LlmSettings {
            base_url,
            ..Default::default()
        };
        AnthropicClient::new(
            ApiCredential::new("test-key", "Anthropic API key"),
            &settings,
            RetryPolicy::none(),
        )
        .unwrap()
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = client("https://api.anthropic.com/v1".to_string());
        let debug = format!("{:?}", client);
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("claude-haiku-4-5-20251001"));
    }

    #[tokio::test]
    async fn test_generate_joins_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "claude-haiku-4-5-20251001",
                "system": "Be terse.",
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"text","text":"Hi"},{"type":"text","text":" there"}],
                    "stop_reason":"end_turn"}"#,
            )
            .create_async()
            .await;

        let text = client(server.url())
            .generate("Hello", Some("Be terse."))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_rate_limit_reports_retry_after() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;

        let err = client(server.url()).generate("Hello", None).await.unwrap_err();
        match err {
            AdapterError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
            )
            .create_async()
            .await;

        let err = client(server.url()).generate("Hello", None).await.unwrap_err();
        match err {
            AdapterError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid x-api-key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
