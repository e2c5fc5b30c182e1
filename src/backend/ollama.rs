//! Backend for Ollama's native API.
//!
//! [`OllamaBackend`] sends the two-message conversation to `/api/chat` and
//! probes `/api/tags` for availability.

use super::{get_ok, pick_metadata, send_json, Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for Ollama's native API.
#[derive(Debug, Clone)]
pub struct OllamaBackend;

impl OllamaBackend {
    /// Build the Ollama `options` object from the LlmConfig.
    fn build_options(request: &LlmRequest) -> Value {
        let mut opts = json!({
            "temperature": request.config.temperature,
            "num_predict": request.config.max_tokens,
        });
        if let Some(ref custom) = request.config.options {
            if let (Some(base), Some(extra)) = (opts.as_object_mut(), custom.as_object()) {
                for (k, v) in extra {
                    base.insert(k.clone(), v.clone());
                }
            }
        }
        opts
    }

    /// Build the JSON body for `/api/chat`.
    fn build_chat_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": request.chat_messages(),
            "stream": false,
            "options": Self::build_options(request),
        });
        if request.config.json_mode {
            body["format"] = json!("json");
        }
        body
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));
        let body = Self::build_chat_body(request);
        let (json_resp, status) = send_json(client.post(&url).json(&body), &url).await?;

        let text = json_resp
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: pick_metadata(
                &json_resp,
                &["total_duration", "eval_count", "prompt_eval_count", "model"],
            ),
        })
    }

    async fn probe(&self, client: &Client, base_url: &str) -> Result<()> {
        let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
        get_ok(client.get(&url), &url).await
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmConfig;

    fn test_request() -> LlmRequest {
        LlmRequest {
            model: "llama3.2:3b".into(),
            system_prompt: Some("Extract address fields.".into()),
            prompt: "Address: 1 Elm St".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_ollama_backend_chat_payload() {
        let body = OllamaBackend::build_chat_body(&test_request());

        assert_eq!(body["model"], "llama3.2:3b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.1);
        assert_eq!(body["options"]["num_predict"], 256);
        assert!(body.get("format").is_none());

        let messages = body["messages"].as_array().expect("messages array");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
    }

    #[test]
    fn test_ollama_backend_json_mode() {
        let mut request = test_request();
        request.config.json_mode = true;
        assert_eq!(OllamaBackend::build_chat_body(&request)["format"], "json");
    }

    #[test]
    fn test_ollama_backend_custom_options() {
        let mut request = test_request();
        request.config.options = Some(json!({"top_p": 0.9, "seed": 42}));

        let body = OllamaBackend::build_chat_body(&request);
        assert_eq!(body["options"]["top_p"], 0.9);
        assert_eq!(body["options"]["seed"], 42);
        assert_eq!(body["options"]["temperature"], 0.1);
    }

    #[tokio::test]
    async fn test_complete_unreachable_is_unavailable() {
        let err = OllamaBackend
            .complete(&Client::new(), "http://127.0.0.1:9", &test_request())
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
    }
}
