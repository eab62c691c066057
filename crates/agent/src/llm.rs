use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;

use demogenie_core::config::LlmConfig;

/// One chat completion: a fixed system instruction plus a rendered prompt.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// 401/403.
    Auth,
    /// 429.
    RateLimit,
    Timeout,
    /// Connection refused, DNS failure, TLS and similar.
    Network,
    /// 5xx.
    ServerError,
    /// The body was not the expected chat-completion envelope.
    InvalidResponse,
    EmptyCompletion,
    Unknown,
}

impl LlmErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::EmptyCompletion => "empty_completion",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("completion failed ({}): {message}", .kind.as_str())]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

const MAX_ERROR_BODY_CHARS: usize = 300;

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self { kind, status: None, message: message.into() }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => LlmErrorKind::Auth,
            408 => LlmErrorKind::Timeout,
            429 => LlmErrorKind::RateLimit,
            500..=599 => LlmErrorKind::ServerError,
            _ => LlmErrorKind::Unknown,
        };

        Self {
            kind,
            status: Some(status),
            message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }

    pub fn network(error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() { LlmErrorKind::Timeout } else { LlmErrorKind::Network };
        Self::new(kind, error.to_string())
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Client for any endpoint speaking the OpenAI `/chat/completions` protocol.
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| LlmError::new(LlmErrorKind::Network, error.to_string()))?;

        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string(), api_key })
    }

    /// `None` when no credential is configured; the brief generator then
    /// never attempts a completion.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, LlmError> {
        let Some(api_key) = config.api_key.clone().filter(|_| config.has_credential()) else {
            return Ok(None);
        };

        Self::new(config.base_url.clone(), api_key, Duration::from_secs(config.timeout_secs))
            .map(Some)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| LlmError::network(&error))?;

        let status = response.status();
        let text = response.text().await.map_err(|error| LlmError::network(&error))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &text));
        }

        let data: Value = serde_json::from_str(&text)
            .map_err(|error| LlmError::new(LlmErrorKind::InvalidResponse, error.to_string()))?;
        extract_content(&data)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completion body.
pub fn extract_content(data: &Value) -> Result<String, LlmError> {
    let content = data["choices"][0]["message"]["content"].as_str().ok_or_else(|| {
        LlmError::new(LlmErrorKind::InvalidResponse, "response has no choices[0].message.content")
    })?;

    if content.trim().is_empty() {
        return Err(LlmError::new(LlmErrorKind::EmptyCompletion, "completion content was empty"));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use demogenie_core::config::AppConfig;

    use super::{extract_content, LlmError, LlmErrorKind, OpenAiChatClient};

    #[test]
    fn status_codes_are_classified() {
        assert_eq!(LlmError::from_status(401, "").kind, LlmErrorKind::Auth);
        assert_eq!(LlmError::from_status(403, "").kind, LlmErrorKind::Auth);
        assert_eq!(LlmError::from_status(429, "").kind, LlmErrorKind::RateLimit);
        assert_eq!(LlmError::from_status(503, "").kind, LlmErrorKind::ServerError);
        assert_eq!(LlmError::from_status(418, "").kind, LlmErrorKind::Unknown);

        let long_body = "x".repeat(1000);
        assert_eq!(LlmError::from_status(500, &long_body).message.len(), 300);
    }

    #[test]
    fn content_is_read_from_first_choice() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"insights\":\"ok\"}" } }]
        });
        assert_eq!(extract_content(&body).expect("content"), "{\"insights\":\"ok\"}");
    }

    #[test]
    fn malformed_or_empty_envelopes_are_typed() {
        let missing = extract_content(&json!({ "error": "nope" })).expect_err("missing");
        assert_eq!(missing.kind, LlmErrorKind::InvalidResponse);

        let empty = extract_content(&json!({ "choices": [{ "message": { "content": "  " } }] }))
            .expect_err("empty");
        assert_eq!(empty.kind, LlmErrorKind::EmptyCompletion);
    }

    #[test]
    fn no_credential_means_no_client() {
        let mut config = AppConfig::default().llm;
        assert!(OpenAiChatClient::from_config(&config).expect("build").is_none());

        config.api_key = Some("   ".to_string().into());
        assert!(OpenAiChatClient::from_config(&config).expect("build").is_none());

        config.api_key = Some("sk-test".to_string().into());
        let client = OpenAiChatClient::from_config(&config).expect("build").expect("client");
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }
}
