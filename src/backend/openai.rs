//! Backend for OpenAI-compatible local servers.
//!
//! [`OpenAiBackend`] covers LM Studio, llama.cpp server, vLLM, LocalAI and
//! Ollama's `/v1/` endpoint. This is the default backend.
//!
//! Completion: `POST /v1/chat/completions`, reply at
//! `choices[0].message.content`. Probe: `GET /v1/models`.

use super::{get_ok, pick_metadata, send_json, Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for any OpenAI-compatible chat completions API.
///
/// # Example
///
/// ```
/// use address_pipeline::backend::OpenAiBackend;
///
/// let backend = OpenAiBackend::new();
/// let with_key = OpenAiBackend::new().with_api_key("lm-studio");
/// ```
#[derive(Clone, Default)]
pub struct OpenAiBackend {
    /// Optional API key. If set, sent as `Authorization: Bearer {key}`.
    pub(crate) api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field(
                "api_key",
                &self.api_key.as_ref().map(|k| match k.get(..6) {
                    Some(prefix) if k.len() > 6 => format!("{}***", prefix),
                    _ => "***".to_string(),
                }),
            )
            .finish()
    }
}

impl OpenAiBackend {
    /// Create a new backend without authentication.
    pub fn new() -> Self {
        Self { api_key: None }
    }

    /// Set the API key for authentication.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Returns `true` if an API key has been configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the request body for `/v1/chat/completions`.
    fn build_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": request.chat_messages(),
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_tokens,
            "stream": false,
        });

        if request.config.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        // Custom options are Ollama-specific and skipped here.
        body
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    fn reply_text(json_resp: &Value) -> String {
        json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let body = Self::build_body(request);

        let (json_resp, status) =
            send_json(self.authorize(client.post(&url).json(&body)), &url).await?;

        Ok(LlmResponse {
            text: Self::reply_text(&json_resp),
            status,
            metadata: pick_metadata(&json_resp, &["usage", "model", "id"]),
        })
    }

    async fn probe(&self, client: &Client, base_url: &str) -> Result<()> {
        let url = format!("{}/v1/models", base_url.trim_end_matches('/'));
        get_ok(self.authorize(client.get(&url)), &url).await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmConfig;

    fn test_request() -> LlmRequest {
        LlmRequest {
            model: "local-model".into(),
            system_prompt: Some("Extract address fields.".into()),
            prompt: "Address: 123 Main St".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_openai_backend_chat_payload() {
        let body = OpenAiBackend::build_body(&test_request());

        assert_eq!(body["model"], "local-model");
        assert_eq!(body["temperature"], 0.1);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["stream"], false);

        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "Address: 123 Main St");

        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_openai_backend_json_mode() {
        let mut request = test_request();
        request.config.json_mode = true;

        let body = OpenAiBackend::build_body(&request);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_openai_backend_custom_options_skipped() {
        let mut request = test_request();
        request.config.options = Some(json!({"top_p": 0.9}));

        let body = OpenAiBackend::build_body(&request);
        assert!(body.get("options").is_none());
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_reply_text_nested_content() {
        let reply = json!({"choices": [{"message": {"role": "assistant", "content": "{\"City\":\"X\"}"}}]});
        assert_eq!(OpenAiBackend::reply_text(&reply), "{\"City\":\"X\"}");
        assert_eq!(OpenAiBackend::reply_text(&json!({"choices": []})), "");
    }

    #[test]
    fn test_openai_backend_auth_header() {
        let backend = OpenAiBackend::new().with_api_key("sk-test123");
        let client = Client::new();
        let req = backend
            .authorize(client.get("http://127.0.0.1:1234/v1/models"))
            .build()
            .expect("build request");

        assert_eq!(req.headers().get("Authorization").expect("auth header"), "Bearer sk-test123");
    }

    #[test]
    fn test_openai_backend_no_auth() {
        let client = Client::new();
        let req = OpenAiBackend::new()
            .authorize(client.get("http://127.0.0.1:1234/v1/models"))
            .build()
            .expect("build request");

        assert!(req.headers().get("Authorization").is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = OpenAiBackend::new().with_api_key("sk-1234567890abcdef");
        let debug_output = format!("{:?}", backend);
        assert!(!debug_output.contains("1234567890abcdef"));
        assert!(debug_output.contains("sk-123***"));
        assert!(backend.has_api_key());
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        let result = OpenAiBackend::new()
            .probe(&Client::new(), "http://127.0.0.1:9")
            .await;
        assert!(result.is_err());
    }
}
