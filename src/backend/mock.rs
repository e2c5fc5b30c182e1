//! Mock backend for testing without a live model server.
//!
//! [`MockBackend`] returns pre-configured replies in order, or simulates an
//! unreachable endpoint, so the fallback policy can be tested
//! deterministically.
//!
//! # Example
//!
//! ```
//! use address_pipeline::backend::MockBackend;
//!
//! let mock = MockBackend::fixed(r#"{"City": "Springfield"}"#);
//! let down = MockBackend::unavailable();
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::{AddressError, Result};

/// A test backend that returns canned replies in order.
///
/// Cycles back to the beginning when all replies have been consumed.
#[derive(Debug)]
pub struct MockBackend {
    responses: Vec<String>,
    available: bool,
    delay: Option<Duration>,
    index: AtomicUsize,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockBackend {
    /// Create a mock backend with the given canned replies.
    ///
    /// Replies are returned in order. When exhausted, cycles from the beginning.
    pub fn new(responses: Vec<String>) -> Self {
        assert!(!responses.is_empty(), "MockBackend requires at least one response");
        Self {
            responses,
            available: true,
            delay: None,
            index: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Create a mock whose endpoint is unreachable: every completion and
    /// probe fails with [`AddressError::ServiceUnavailable`].
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::fixed("")
        }
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completion calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// User prompt of the most recent completion call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    fn next_response(&self) -> String {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[idx].clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(request.prompt.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if !self.available {
            return Err(AddressError::unavailable("mock endpoint is down"));
        }
        Ok(LlmResponse {
            text: self.next_response(),
            status: 200,
            metadata: None,
        })
    }

    async fn probe(&self, _client: &Client, _base_url: &str) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(AddressError::unavailable("mock endpoint is down"))
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
