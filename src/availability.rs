//! Advisory availability probe for the inference endpoint.
//!
//! The probe answers "is the model server up?" for status display only. It
//! never gates parsing: the pipeline always attempts the model and falls back
//! on failure. Results are cached for a short TTL so a status indicator can
//! poll it freely.

use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long a probe result is reused.
pub const DEFAULT_PROBE_TTL: Duration = Duration::from_secs(30);

/// Cached, time-bounded reachability check.
///
/// # Example
///
/// ```no_run
/// use address_pipeline::{AvailabilityProbe, ExecCtx};
///
/// # async fn run() {
/// let ctx = ExecCtx::local();
/// let probe = AvailabilityProbe::new();
/// let status = if probe.is_available(&ctx).await { "model" } else { "patterns" };
/// println!("parser: {}", status);
/// # }
/// ```
#[derive(Debug)]
pub struct AvailabilityProbe {
    ttl: Duration,
    last: Mutex<Option<(Instant, bool)>>,
}

impl Default for AvailabilityProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityProbe {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_PROBE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            last: Mutex::new(None),
        }
    }

    /// Cached result if still fresh.
    pub fn cached(&self) -> Option<bool> {
        let guard = self.last.lock().ok()?;
        match *guard {
            Some((at, available)) if at.elapsed() < self.ttl => Some(available),
            _ => None,
        }
    }

    /// Reachability of the endpoint, served from cache while fresh.
    pub async fn is_available(&self, ctx: &ExecCtx) -> bool {
        if let Some(available) = self.cached() {
            emit(
                &ctx.event_handler,
                Event::Probe {
                    available,
                    cached: true,
                },
            );
            return available;
        }
        self.refresh(ctx).await
    }

    /// Probe now, ignoring the cache, and store the result.
    pub async fn refresh(&self, ctx: &ExecCtx) -> bool {
        let probe = ctx.backend.probe(&ctx.client, &ctx.base_url);
        let available = match tokio::time::timeout(ctx.timeout, probe).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::debug!("probe failed: {}", e);
                false
            }
            Err(_) => {
                log::debug!("probe timed out after {:?}", ctx.timeout);
                false
            }
        };

        if let Ok(mut guard) = self.last.lock() {
            *guard = Some((Instant::now(), available));
        }
        emit(
            &ctx.event_handler,
            Event::Probe {
                available,
                cached: false,
            },
        );
        available
    }

    /// Forget the cached result.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.last.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::events::{EventHandler, FnEventHandler};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ctx(mock: MockBackend, handler: Option<Arc<dyn EventHandler>>) -> ExecCtx {
        let mut builder = ExecCtx::builder("http://unused").backend(Arc::new(mock));
        if let Some(h) = handler {
            builder = builder.event_handler(h);
        }
        builder.build()
    }

    #[tokio::test]
    async fn test_available_and_cached() {
        let fresh = Arc::new(AtomicUsize::new(0));
        let counter = fresh.clone();
        let handler: Arc<dyn EventHandler> = Arc::new(FnEventHandler(move |event: Event| {
            if let Event::Probe { cached: false, .. } = event {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }));
        let ctx = ctx(MockBackend::fixed("{}"), Some(handler));
        let probe = AvailabilityProbe::new();

        assert_eq!(probe.cached(), None);
        assert!(probe.is_available(&ctx).await);
        assert!(probe.is_available(&ctx).await);
        assert_eq!(probe.cached(), Some(true));
        assert_eq!(fresh.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let ctx = ctx(MockBackend::unavailable(), None);
        let probe = AvailabilityProbe::new();
        assert!(!probe.is_available(&ctx).await);
        assert_eq!(probe.cached(), Some(false));
    }

    #[tokio::test]
    async fn test_expired_entry_is_ignored() {
        let ctx = ctx(MockBackend::fixed("{}"), None);
        let probe = AvailabilityProbe::with_ttl(Duration::ZERO);
        assert!(probe.refresh(&ctx).await);
        assert_eq!(probe.cached(), None);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let ctx = ctx(MockBackend::fixed("{}"), None);
        let probe = AvailabilityProbe::new();
        probe.refresh(&ctx).await;
        probe.invalidate();
        assert_eq!(probe.cached(), None);
    }
}
