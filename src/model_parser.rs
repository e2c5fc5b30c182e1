//! Model-assisted address parser.
//!
//! [`ModelParser`] sends the cleaned address plus a fixed instruction to the
//! configured [`Backend`](crate::backend::Backend), pulls the first JSON object
//! out of the free-text reply and projects it onto the six canonical fields.
//! It makes exactly one attempt; every failure is returned to the caller,
//! which is expected to fall back to the deterministic parser.

use crate::{
    backend::{LlmRequest, LlmResponse},
    client::LlmConfig,
    error::{AddressError, Result},
    events::{emit, Event},
    exec_ctx::ExecCtx,
    extract,
    prompt,
    types::{AddressField, ParsedAddress},
};
use serde_json::{Map, Value};

/// Delegates address decomposition to a local language model.
///
/// # Example
///
/// ```no_run
/// use address_pipeline::{ExecCtx, ModelParser};
///
/// # async fn run() -> address_pipeline::Result<()> {
/// let ctx = ExecCtx::local();
/// let address = ModelParser::new().parse(&ctx, "123 Main St, Springfield, IL 62704").await?;
/// println!("{}", address.city);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ModelParser {
    system_prompt: String,
    user_template: String,
    config: LlmConfig,
}

impl Default for ModelParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelParser {
    pub fn new() -> Self {
        Self {
            system_prompt: prompt::SYSTEM_INSTRUCTION.to_string(),
            user_template: prompt::USER_TEMPLATE.to_string(),
            config: LlmConfig::default(),
        }
    }

    /// Returns the LLM config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Set the sampling configuration.
    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = system.into();
        self
    }

    /// Replace the user template. `{input}` marks where the address goes.
    pub fn with_user_template(mut self, template: impl Into<String>) -> Self {
        self.user_template = template.into();
        self
    }

    fn build_request(&self, ctx: &ExecCtx, address: &str) -> LlmRequest {
        LlmRequest {
            model: ctx.model.clone(),
            system_prompt: Some(self.system_prompt.clone()),
            prompt: prompt::render(&self.user_template, address),
            config: self.config.clone(),
        }
    }

    /// Call the backend once, bounded by `ctx.timeout`.
    async fn call_backend(&self, ctx: &ExecCtx, request: &LlmRequest) -> Result<LlmResponse> {
        emit(
            &ctx.event_handler,
            Event::ModelAttempt {
                backend: ctx.backend.name(),
            },
        );

        let call = ctx.backend.complete(&ctx.client, &ctx.base_url, request);
        match tokio::time::timeout(ctx.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AddressError::unavailable(format!(
                "no reply from {} within {:?}",
                ctx.base_url, ctx.timeout
            ))),
        }
    }

    /// Decompose `address` with the model.
    ///
    /// # Errors
    ///
    /// - [`AddressError::ServiceUnavailable`] on transport failure, timeout or
    ///   a non-2xx status.
    /// - [`AddressError::UnparsableResponse`] when the reply holds no valid
    ///   JSON object.
    pub async fn parse(&self, ctx: &ExecCtx, address: &str) -> Result<ParsedAddress> {
        let request = self.build_request(ctx, address);
        let response = self.call_backend(ctx, &request).await?;
        log::debug!("{}", reply_summary(ctx.backend.name(), &response));

        let object = extract::extract_object(&response.text)?;
        Ok(project(&object))
    }
}

/// One-line description of a backend reply: status, length and any
/// provider metadata (token usage, timings).
fn reply_summary(backend: &str, response: &LlmResponse) -> String {
    let mut summary = format!(
        "{} replied with status {} ({} chars)",
        backend,
        response.status,
        response.text.chars().count()
    );
    if let Some(ref meta) = response.metadata {
        summary.push_str(&format!(" {}", meta));
    }
    summary
}

/// Project a reply object onto the canonical six fields.
///
/// Present, non-empty values are kept; everything else is defaulted. Extra
/// keys are discarded.
pub fn project(object: &Map<String, Value>) -> ParsedAddress {
    let mut address = ParsedAddress::default();
    for field in AddressField::ALL {
        let value = lookup(object, field.key())
            .and_then(value_text)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| field.default_value().to_string());
        address.set(field, value);
    }
    address
}

/// Exact key first, then ASCII case-insensitive.
fn lookup<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).or_else(|| {
        object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
