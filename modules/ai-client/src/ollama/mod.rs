mod client;
pub(crate) mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{AiError, Result};
use crate::traits::ChatModel;

use client::{OllamaClient, OLLAMA_API_URL};
use types::{ChatRequest, ChatResponse, WireMessage};

// =============================================================================
// Ollama Agent
// =============================================================================

/// Chat against a local (or remote) Ollama server.
#[derive(Debug, Clone)]
pub struct Ollama {
    model: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl Ollama {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: OLLAMA_API_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> Result<OllamaClient> {
        OllamaClient::new(&self.base_url, self.timeout)
    }
}

/// The reply text, or `EmptyResponse` when the server sent no usable content.
fn reply_text(response: ChatResponse) -> Result<String> {
    match response.message {
        Some(message) if !message.content.trim().is_empty() => Ok(message.content),
        _ => Err(AiError::EmptyResponse),
    }
}

#[async_trait]
impl ChatModel for Ollama {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest::new(&self.model).message(WireMessage::user(prompt));
        let response = self.client()?.chat(&request).await?;

        reply_text(response).inspect_err(|_| {
            warn!(model = %self.model, "Ollama reply had no message content");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_new() {
        let ai = Ollama::new("mistral");
        assert_eq!(ai.model(), "mistral");
        assert_eq!(ai.base_url(), "http://localhost:11434");
        assert!(ai.timeout.is_none());
    }

    #[test]
    fn test_ollama_builders() {
        let ai = Ollama::new("llama3")
            .with_base_url("http://gpu-box:11434")
            .with_timeout(Duration::from_secs(90));
        assert_eq!(ai.base_url(), "http://gpu-box:11434");
        assert_eq!(ai.timeout, Some(Duration::from_secs(90)));
    }

    fn response(json: &str) -> ChatResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn blank_content_is_empty_response() {
        for json in [
            r#"{"message": {"role": "assistant", "content": "  \n "}, "done": true}"#,
            r#"{"message": {"role": "assistant"}, "done": true}"#,
            r#"{"done": true}"#,
        ] {
            let err = reply_text(response(json)).unwrap_err();
            assert!(matches!(err, AiError::EmptyResponse), "{json}");
            assert!(!err.is_transport());
        }
    }

    #[test]
    fn content_is_returned_verbatim() {
        let text = reply_text(response(
            r#"{"message": {"role": "assistant", "content": "{\"name\": \"x\"}"}, "done": true}"#,
        ))
        .unwrap();
        assert_eq!(text, r#"{"name": "x"}"#);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let ai = Ollama::new("mistral")
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));
        let err = ai.complete("hello").await.unwrap_err();
        assert!(err.is_transport());
    }
}
