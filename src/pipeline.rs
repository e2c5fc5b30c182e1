use crate::{
    clean,
    error::{AddressError, Result},
    events::{emit, Event},
    exec_ctx::ExecCtx,
    heuristic::DeterministicParser,
    model_parser::ModelParser,
    types::{ParseOutcome, ParsedAddress},
};

/// Dual-strategy address parser.
///
/// Tries the model-assisted parser once; on any failure (unreachable
/// endpoint, timeout, non-2xx status, unusable reply) the deterministic
/// parser runs on the same input. Callers therefore always get a complete
/// [`ParseOutcome`], tagged with the strategy that produced it.
///
/// The pipeline holds no per-call state and can be shared behind `Arc`.
///
/// # Example
///
/// ```no_run
/// use address_pipeline::{AddressPipeline, ExecCtx};
///
/// # async fn run() -> address_pipeline::Result<()> {
/// let ctx = ExecCtx::local();
/// let outcome = AddressPipeline::new()
///     .parse(&ctx, "123 Main St Apt 4B\nSpringfield, IL 62704")
///     .await?;
/// println!("{} (model: {})", outcome.address.city, outcome.used_model);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AddressPipeline {
    model: Option<ModelParser>,
    fallback: DeterministicParser,
}

impl Default for AddressPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressPipeline {
    /// Model first, deterministic fallback.
    pub fn new() -> Self {
        Self {
            model: Some(ModelParser::new()),
            fallback: DeterministicParser::new(),
        }
    }

    /// Skip the model entirely.
    pub fn deterministic_only() -> Self {
        Self {
            model: None,
            fallback: DeterministicParser::new(),
        }
    }

    /// Replace the model-assisted parser (prompt, sampling config).
    pub fn with_model_parser(mut self, parser: ModelParser) -> Self {
        self.model = Some(parser);
        self
    }

    /// Replace the fallback parser.
    pub fn with_fallback(mut self, parser: DeterministicParser) -> Self {
        self.fallback = parser;
        self
    }

    /// Whether a model attempt is made before falling back.
    pub fn uses_model(&self) -> bool {
        self.model.is_some()
    }

    /// Parse a raw address.
    ///
    /// # Errors
    ///
    /// Only [`AddressError::InputInvalid`], for empty or whitespace-only
    /// input. Model-path failures are recovered by the fallback.
    pub async fn parse(&self, ctx: &ExecCtx, raw: &str) -> Result<ParseOutcome> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(AddressError::InputInvalid(
                "address text is empty".to_string(),
            ));
        }

        emit(
            &ctx.event_handler,
            Event::ParseStart {
                chars: text.chars().count(),
            },
        );

        let outcome = match self.try_model(ctx, text).await {
            Some(address) => ParseOutcome::from_model(address),
            None => ParseOutcome::from_fallback(self.fallback.parse(text)),
        };

        emit(
            &ctx.event_handler,
            Event::ParseEnd {
                used_model: outcome.used_model,
            },
        );
        Ok(outcome)
    }

    /// Strip an attention marker and the contact name, then [`parse`](Self::parse).
    pub async fn parse_with_contact(
        &self,
        ctx: &ExecCtx,
        raw: &str,
        contact: Option<&str>,
    ) -> Result<ParseOutcome> {
        let text = clean::prepare(raw, contact)?;
        self.parse(ctx, &text).await
    }

    async fn try_model(&self, ctx: &ExecCtx, text: &str) -> Option<ParsedAddress> {
        let parser = self.model.as_ref()?;
        match parser.parse(ctx, text).await {
            Ok(address) => Some(address),
            Err(e) => {
                log::warn!("model parse failed, using patterns: {}", e);
                emit(
                    &ctx.event_handler,
                    Event::Fallback {
                        reason: e.to_string(),
                    },
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::events::{EventHandler, FnEventHandler};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const FULL_REPLY: &str = r#"{"Address1": "742 Evergreen Terrace", "Address2": "", "City": "Springfield", "State": "OR", "ZIP": "97403", "Country": "USA"}"#;

    fn ctx_with(mock: MockBackend) -> ExecCtx {
        ExecCtx::builder("http://unused").backend(Arc::new(mock)).build()
    }

    fn recording_ctx(mock: MockBackend) -> (ExecCtx, Arc<Mutex<Vec<Event>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let handler: Arc<dyn EventHandler> = Arc::new(FnEventHandler(move |event: Event| {
            sink.lock().unwrap().push(event);
        }));
        let ctx = ExecCtx::builder("http://unused")
            .backend(Arc::new(mock))
            .event_handler(handler)
            .build();
        (ctx, events)
    }

    #[tokio::test]
    async fn test_model_path_precedence() {
        let ctx = ctx_with(MockBackend::fixed(FULL_REPLY));
        let outcome = AddressPipeline::new()
            .parse(&ctx, "742 Evergreen Terrace Springfield")
            .await
            .unwrap();
        assert!(outcome.used_model);
        let reply: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(FULL_REPLY).unwrap();
        assert_eq!(outcome.address, crate::model_parser::project(&reply));
        assert_eq!(outcome.address.address1, "742 Evergreen Terrace");
        assert_eq!(outcome.address.city, "Springfield");
    }

    #[tokio::test]
    async fn test_fallback_matches_deterministic_parser() {
        let inputs = [
            "123 Main St Apt 4B, Springfield, IL 62704",
            "123 Main St San Francisco CA 94105",
            "500 Oak Ave\nSuite 200\nAustin, TX 78701-1234",
            "just some words",
        ];
        let pipeline = AddressPipeline::new();
        let deterministic = DeterministicParser::new();
        for mock in [
            MockBackend::unavailable(),
            MockBackend::fixed("Sorry, I can't do that."),
            MockBackend::fixed("{\"City\": oops}"),
        ] {
            let ctx = ctx_with(mock);
            for input in inputs {
                let outcome = pipeline.parse(&ctx, input).await.unwrap();
                assert!(!outcome.used_model, "input {:?}", input);
                assert_eq!(outcome.address, deterministic.parse(input), "input {:?}", input);
            }
        }
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let ctx = ExecCtx::builder("http://unused")
            .backend(Arc::new(
                MockBackend::fixed(FULL_REPLY).with_delay(Duration::from_millis(500)),
            ))
            .timeout(Duration::from_millis(20))
            .build();
        let outcome = AddressPipeline::new()
            .parse(&ctx, "1 Elm St, Reno, NV 89501")
            .await
            .unwrap();
        assert!(!outcome.used_model);
        assert_eq!(outcome.address.city, "Reno");
    }

    #[tokio::test]
    async fn test_empty_input_is_invalid() {
        let mock = Arc::new(MockBackend::fixed(FULL_REPLY));
        let ctx = ExecCtx::builder("http://unused").backend(mock.clone()).build();
        let pipeline = AddressPipeline::new();
        for input in ["", "   ", "\n\t\r\n"] {
            let err = pipeline.parse(&ctx, input).await.unwrap_err();
            assert!(matches!(err, AddressError::InputInvalid(_)));
        }
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_deterministic_only_skips_backend() {
        let mock = Arc::new(MockBackend::fixed(FULL_REPLY));
        let ctx = ExecCtx::builder("http://unused").backend(mock.clone()).build();
        let pipeline = AddressPipeline::deterministic_only();
        assert!(!pipeline.uses_model());
        let outcome = pipeline.parse(&ctx, "1 Elm St, Reno, NV").await.unwrap();
        assert!(!outcome.used_model);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_events_on_fallback() {
        let (ctx, events) = recording_ctx(MockBackend::unavailable());
        AddressPipeline::new().parse(&ctx, "1 Elm St").await.unwrap();

        let events = events.lock().unwrap();
        assert!(matches!(events[0], Event::ParseStart { chars: 8 }));
        assert!(matches!(events[1], Event::ModelAttempt { backend: "mock" }));
        match &events[2] {
            Event::Fallback { reason } => assert!(reason.contains("unavailable")),
            other => panic!("expected fallback, got {:?}", other),
        }
        assert!(matches!(events[3], Event::ParseEnd { used_model: false }));
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn test_events_on_model_success() {
        let (ctx, events) = recording_ctx(MockBackend::fixed(FULL_REPLY));
        AddressPipeline::new().parse(&ctx, "x").await.unwrap();
        let events = events.lock().unwrap();
        assert!(!events.iter().any(|e| matches!(e, Event::Fallback { .. })));
        assert!(matches!(events.last(), Some(Event::ParseEnd { used_model: true })));
    }

    #[tokio::test]
    async fn test_parse_with_contact_cleans_prompt() {
        let mock = Arc::new(MockBackend::fixed(FULL_REPLY));
        let ctx = ExecCtx::builder("http://unused").backend(mock.clone()).build();
        AddressPipeline::new()
            .parse_with_contact(&ctx, "Attn: Homer Simpson\n742 Evergreen Terrace", Some("Homer Simpson"))
            .await
            .unwrap();
        let prompt = mock.last_prompt().unwrap();
        assert!(prompt.ends_with("742 Evergreen Terrace"));
        assert!(!prompt.contains("Homer"));
    }

    #[tokio::test]
    async fn test_parse_with_contact_only_name_is_invalid() {
        let ctx = ctx_with(MockBackend::fixed(FULL_REPLY));
        let err = AddressPipeline::new()
            .parse_with_contact(&ctx, "Homer Simpson", Some("homer simpson"))
            .await
            .unwrap_err();
        assert!(matches!(err, AddressError::InputInvalid(_)));
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let pipeline = Arc::new(AddressPipeline::new());
        let ctx = Arc::new(ctx_with(MockBackend::unavailable()));
        let mut handles = Vec::new();
        for i in 0..8 {
            let pipeline = pipeline.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                let input = format!("{} Main St, Springfield, IL 62704", 100 + i);
                pipeline.parse(&ctx, &input).await
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let outcome = handle.await.unwrap().unwrap();
            assert_eq!(outcome.address.address1, format!("{} Main St", 100 + i));
            assert_eq!(outcome.address.zip, "62704");
        }
    }

    #[test]
    fn test_blocking_caller() {
        let ctx = ctx_with(MockBackend::unavailable());
        let outcome = tokio_test::block_on(
            AddressPipeline::new().parse(&ctx, "9 Elm Rd Suite 5 San Jose CA 95112"),
        )
        .unwrap();
        assert!(!outcome.used_model);
        assert_eq!(outcome.address.address2, "Suite 5");
        assert_eq!(outcome.address.city, "San Jose");
        assert_eq!(outcome.address.country, "USA");
    }
}
