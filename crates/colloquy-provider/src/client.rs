//! Completion client trait and HTTP implementation.
//!
//! `HttpCompletionClient` speaks the OpenAI-compatible chat completions
//! wire format: POST `{base_url}/chat/completions` with bearer auth,
//! extracting `choices[0].message.content` and passing `usage` through
//! verbatim.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Errors from the completion provider boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The overall wall-clock deadline elapsed, spanning all attempts.
    #[error("completion deadline elapsed")]
    Timeout,
    /// Retryable failure: rate limiting, server errors, network faults.
    #[error("transient provider error: {0}")]
    Transient(String),
    /// Non-retryable failure: bad credentials, malformed request.
    #[error("fatal provider error: {0}")]
    Fatal(String),
}

impl ProviderError {
    /// Whether the retry policy may attempt the call again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}

/// A single `{role, content}` turn sent to the provider.
///
/// The minimal shape the completion endpoint expects; roles include
/// "system" for the prompt preamble in addition to stored message roles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: String,
    pub content: String,
}

impl ContextMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A chat completion request.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ContextMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ContextMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// A successful completion: generated text plus provider metadata.
#[derive(Clone, Debug)]
pub struct Completion {
    pub content: String,
    pub model: String,
    /// Token accounting as returned by the provider, verbatim.
    pub usage: Option<serde_json::Value>,
}

/// Abstraction over the external AI completion provider.
///
/// Constructed once at the composition root and injected into the
/// orchestrator, so tests can substitute a double.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError>;
}

/// HTTP client for OpenAI-compatible chat completion endpoints.
pub struct HttpCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpCompletionClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        debug!(model = %request.model, turns = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            // Connection refused, DNS failure, mid-request timeout: retryable.
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &detail));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("Invalid response body: {}", e)))?;

        parse_completion(&payload, &request.model)
    }
}

/// Map an HTTP error status to the provider error taxonomy.
///
/// 429 and 5xx are transient (rate limiting, provider hiccups); every
/// other client error is fatal (bad credentials, malformed request).
fn classify_status(status: StatusCode, detail: &str) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ProviderError::Transient(format!("HTTP {}: {}", status.as_u16(), detail))
    } else {
        ProviderError::Fatal(format!("HTTP {}: {}", status.as_u16(), detail))
    }
}

/// Extract the completion from a chat completions response payload.
fn parse_completion(
    payload: &serde_json::Value,
    requested_model: &str,
) -> Result<Completion, ProviderError> {
    let content = payload["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            ProviderError::Fatal("Invalid response format: missing content".to_string())
        })?
        .to_string();

    // Providers echo the resolved model name; fall back to what we asked for.
    let model = payload["model"]
        .as_str()
        .unwrap_or(requested_model)
        .to_string();

    let usage = match payload.get("usage") {
        Some(serde_json::Value::Null) | None => None,
        Some(value) => Some(value.clone()),
    };

    Ok(Completion {
        content,
        model,
        usage,
    })
}
