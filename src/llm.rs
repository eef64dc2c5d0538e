//! Language-model collaborator.
//!
//! Defines the [`TextGenerator`] seam and its Ollama-backed implementation.
//! Every call is time-bounded and returns a structural [`LlmError`] on
//! failure. Callers branch on the `Result`, never on the shape of the
//! returned text, so a failure can never be mistaken for a genuine summary
//! or answer.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;

/// Errors crossing the language-model boundary.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Text-generation seam. The batch drivers and the answer composer depend on
/// this trait rather than on a concrete client, so tests substitute a mock.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate free text for a prompt, bounded by `timeout`.
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError>;
}

/// Client for Ollama's `/api/generate` endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        // Per-request timeouts are passed to generate(); the client-level
        // connect timeout just keeps an unreachable host from stalling.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(timeout)
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(timeout)
            } else {
                LlmError::MalformedResponse(e.to_string())
            }
        })?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| LlmError::MalformedResponse("missing 'response' field".to_string()))?;

        Ok(text.trim().to_string())
    }
}
