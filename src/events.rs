//! Event system for parse lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe which strategy handled
//! a request and why the model path was abandoned. Users can implement
//! [`EventHandler`] to receive these events for logging, status display, or
//! metrics. Every event is also mirrored to the `log` facade at debug level.

use std::sync::Arc;

/// Events emitted during a parse call.
#[derive(Debug, Clone)]
pub enum Event {
    /// A parse call has started.
    ParseStart {
        /// Length of the cleaned input in characters.
        chars: usize,
    },
    /// The model-assisted parser is about to call the backend.
    ModelAttempt {
        /// Backend name (e.g. `"openai"`, `"ollama"`).
        backend: &'static str,
    },
    /// The model path failed; the deterministic parser takes over.
    Fallback {
        /// Why the model path was abandoned.
        reason: String,
    },
    /// A parse call has finished.
    ParseEnd {
        /// Whether the model produced the result.
        used_model: bool,
    },
    /// An availability probe completed.
    Probe {
        /// Whether the endpoint answered with a 2xx.
        available: bool,
        /// Whether the answer came from the cache.
        cached: bool,
    },
}

/// Handler for parse lifecycle events.
///
/// This is entirely optional -- parsing works without an event handler.
///
/// # Example
///
/// ```
/// use address_pipeline::events::{Event, EventHandler};
///
/// struct StatusLine;
///
/// impl EventHandler for StatusLine {
///     fn on_event(&self, event: Event) {
///         if let Event::Fallback { reason } = event {
///             eprintln!("model unavailable, using patterns: {}", reason);
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the pipeline emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present, and log it.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    log::debug!("{:?}", event);
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use address_pipeline::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::ParseEnd { used_model } = event {
///         println!("model used: {}", used_model);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
