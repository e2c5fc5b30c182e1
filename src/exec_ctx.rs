//! Execution context shared across parse calls.
//!
//! [`ExecCtx`] carries the HTTP client, inference backend, endpoint, model
//! identifier, timeout and optional event handler. It holds no per-request
//! state, so one context can be shared by any number of concurrent parses.

use crate::backend::{Backend, OpenAiBackend};
use crate::events::EventHandler;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Loopback address of the local inference server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1234";

/// Model identifier sent when none is configured. Local servers answer with
/// whatever model is loaded.
pub const DEFAULT_MODEL: &str = "local-model";

/// Upper bound on one model round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared execution context for parse calls.
///
/// # Example
///
/// ```
/// use address_pipeline::ExecCtx;
/// use std::time::Duration;
///
/// let ctx = ExecCtx::builder("http://127.0.0.1:1234")
///     .model("qwen2.5-7b-instruct")
///     .timeout(Duration::from_secs(3))
///     .build();
/// ```
pub struct ExecCtx {
    /// HTTP client (cheap to clone -- uses `Arc` internally).
    pub client: Client,
    /// Base URL of the inference server, without provider path suffixes.
    pub base_url: String,
    /// Inference backend. Default: [`OpenAiBackend`].
    pub backend: Arc<dyn Backend>,
    /// Model identifier placed in every request.
    pub model: String,
    /// Bound on a single backend call.
    pub timeout: Duration,
    /// Optional event handler for lifecycle events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtx {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            model: None,
            event_handler: None,
            timeout: None,
        }
    }

    /// Context for the default loopback endpoint.
    pub fn local() -> Self {
        Self::builder(DEFAULT_BASE_URL).build()
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    model: Option<String>,
    event_handler: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl ExecCtxBuilder {
    /// Set the HTTP client. If not set, a client with the configured timeout
    /// is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the inference backend. Default: [`OpenAiBackend`].
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use Ollama's native API instead of the OpenAI-compatible one.
    pub fn ollama(mut self) -> Self {
        self.backend = Some(Arc::new(crate::backend::OllamaBackend));
        self
    }

    /// Set the model identifier. Default: [`DEFAULT_MODEL`].
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the request timeout. Default: [`DEFAULT_TIMEOUT`].
    ///
    /// Applied to the built client and, independently, around every backend
    /// call, so it also bounds a custom `.client()` or backend.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the execution context.
    pub fn build(self) -> ExecCtx {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = self.client.unwrap_or_else(|| {
            Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
                log::warn!("falling back to default HTTP client: {}", e);
                Client::new()
            })
        });
        ExecCtx {
            client,
            base_url: normalize_base_url(&self.base_url),
            backend: self.backend.unwrap_or_else(|| Arc::new(OpenAiBackend::new())),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout,
            event_handler: self.event_handler,
        }
    }
}

/// Strip known provider path suffixes from a base URL.
/// This prevents double-pathing when backends append their own paths.
/// e.g., "http://127.0.0.1:1234/v1" -> "http://127.0.0.1:1234"
/// e.g., "http://localhost:11434/api" -> "http://localhost:11434"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    // longest first
    for suffix in &[
        "/v1/chat/completions",
        "/v1/models",
        "/v1",
        "/api/chat",
        "/api/tags",
        "/api",
    ] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}
