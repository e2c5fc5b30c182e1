//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over local inference servers, translating
//! between normalized [`LlmRequest`]/[`LlmResponse`] types and the
//! provider-specific HTTP API. Built-in implementations: [`OpenAiBackend`]
//! (the default, for LM Studio / llama.cpp / vLLM style servers),
//! [`OllamaBackend`], and [`MockBackend`] for tests.
//!
//! ## Architecture
//!
//! ```text
//! ModelParser ──► LlmRequest ──► Backend::complete() ──► LlmResponse
//!                                       │
//!                            ┌──────────┴──────────┐
//!                      OpenAiBackend          OllamaBackend
//!                  /v1/chat/completions         /api/chat
//!                  /v1/models (probe)        /api/tags (probe)
//! ```

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::client::LlmConfig;
use crate::error::{AddressError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

/// A normalized LLM request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier. Local servers usually ignore it or serve whatever
    /// model is loaded.
    pub model: String,

    /// System instruction. Skipped when `None` or empty.
    pub system_prompt: Option<String>,

    /// The user message text.
    pub prompt: String,

    /// Sampling configuration.
    pub config: LlmConfig,
}

impl LlmRequest {
    /// The two-message conversation sent to chat endpoints.
    pub(crate) fn chat_messages(&self) -> Vec<Value> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref sys) = self.system_prompt {
            if !sys.is_empty() {
                messages.push(json!({"role": "system", "content": sys}));
            }
        }
        messages.push(json!({"role": "user", "content": self.prompt}));
        messages
    }
}

/// A normalized LLM response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, timing, model info).
    pub metadata: Option<Value>,
}

/// Abstraction over inference providers.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a single non-streaming completion.
    ///
    /// Transport failures and non-2xx statuses map to
    /// [`AddressError::ServiceUnavailable`]; a reply whose envelope is not
    /// JSON maps to [`AddressError::UnparsableResponse`].
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Lightweight reachability check against the models listing.
    ///
    /// `Ok(())` for any 2xx response.
    async fn probe(&self, client: &Client, base_url: &str) -> Result<()>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Send a prepared request and decode the JSON envelope.
pub(crate) async fn send_json(builder: RequestBuilder, url: &str) -> Result<(Value, u16)> {
    let resp = builder
        .send()
        .await
        .map_err(|e| AddressError::unavailable(format!("Failed to connect to LLM at {}: {}", url, e)))?;

    let status = resp.status().as_u16();

    if !resp.status().is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(AddressError::ServiceUnavailable {
            status: Some(status),
            message: text,
        });
    }

    let json_resp: Value = resp
        .json()
        .await
        .map_err(|e| AddressError::UnparsableResponse(format!("reply body is not JSON: {}", e)))?;
    Ok((json_resp, status))
}

/// Issue a GET and succeed on any 2xx status.
pub(crate) async fn get_ok(builder: RequestBuilder, url: &str) -> Result<()> {
    let resp = builder
        .send()
        .await
        .map_err(|e| AddressError::unavailable(format!("Failed to reach {}: {}", url, e)))?;

    if resp.status().is_success() {
        Ok(())
    } else {
        Err(AddressError::ServiceUnavailable {
            status: Some(resp.status().as_u16()),
            message: format!("probe of {} failed", url),
        })
    }
}

/// Copy the named top-level fields of a reply into a metadata object.
pub(crate) fn pick_metadata(json_resp: &Value, keys: &[&str]) -> Option<Value> {
    let mut meta = serde_json::Map::new();
    for key in keys {
        if let Some(v) = json_resp.get(*key) {
            meta.insert((*key).into(), v.clone());
        }
    }
    if meta.is_empty() {
        None
    } else {
        Some(Value::Object(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(system: Option<&str>) -> LlmRequest {
        LlmRequest {
            model: "local".into(),
            system_prompt: system.map(str::to_string),
            prompt: "123 Main St".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_chat_messages_with_system() {
        let messages = request(Some("Extract fields.")).chat_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "Extract fields.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "123 Main St");
    }

    #[test]
    fn test_chat_messages_skips_empty_system() {
        assert_eq!(request(Some("")).chat_messages().len(), 1);
        assert_eq!(request(None).chat_messages().len(), 1);
    }

    #[test]
    fn test_pick_metadata() {
        let reply = json!({"model": "m", "usage": {"total_tokens": 9}, "other": 1});
        let meta = pick_metadata(&reply, &["usage", "model", "id"]).unwrap();
        assert_eq!(meta["model"], "m");
        assert_eq!(meta["usage"]["total_tokens"], 9);
        assert!(meta.get("other").is_none());
        assert!(pick_metadata(&json!({}), &["model"]).is_none());
    }

    #[tokio::test]
    async fn test_send_json_unreachable_is_unavailable() {
        let client = Client::new();
        let url = "http://127.0.0.1:9/v1/chat/completions";
        let err = send_json(client.post(url).json(&json!({})), url)
            .await
            .unwrap_err();
        assert!(matches!(err, AddressError::ServiceUnavailable { status: None, .. }));
    }
}
