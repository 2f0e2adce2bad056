//! Per-step failure reporting
//!
//! When a step's implementation returns an error, the sequencer catches
//! it at the invoke site, formats a user-facing diagnostic identifying
//! the owning definition and the 1-based step number, and forwards it to
//! the engine's error sink. One failure produces exactly one report.

use super::cache::InvocationCache;

/// Receiver for user-facing failure reports
///
/// `diagnostic` identifies the failing step; `detail` carries the error
/// chain. Implementations must not panic and must not block for long:
/// they run on the thread that hit the failure.
pub trait ErrorSink: Send + Sync {
    /// Receive one failing step's report
    fn report(&self, diagnostic: &str, detail: &str, cache: &InvocationCache);
}

impl<F> ErrorSink for F
where
    F: Fn(&str, &str, &InvocationCache) + Send + Sync,
{
    fn report(&self, diagnostic: &str, detail: &str, cache: &InvocationCache) {
        self(diagnostic, detail, cache)
    }
}

/// Sink that discards reports, leaving only the log line
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn report(&self, _diagnostic: &str, _detail: &str, _cache: &InvocationCache) {}
}

/// Formats failing-step diagnostics and forwards them to the sink
pub struct ErrorReporter {
    sink: Box<dyn ErrorSink>,
}

impl ErrorReporter {
    /// Create a reporter forwarding to `sink`
    pub fn new(sink: Box<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    /// Diagnostic prefix naming the owning definition and the step the
    /// run is currently on, numbered from 1
    pub fn describe(cache: &InvocationCache) -> String {
        let sequence = cache.sequence();
        format!(
            "Error with {} \"{}\", Action #{}",
            sequence.kind,
            sequence.name,
            cache.cursor() + 1
        )
    }

    /// Report one failing step: log it and forward it to the sink
    pub(crate) fn failing_step(&self, cache: &InvocationCache, err: &anyhow::Error) {
        let diagnostic = Self::describe(cache);
        let detail = format!("{err:#}");
        tracing::error!("{} (run {}): {}", diagnostic, cache.id(), detail);
        self.sink.report(&diagnostic, &detail, cache);
    }
}
