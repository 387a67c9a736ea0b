use std::fmt;
use std::sync::Arc;

/// Source of the distributed-trace id active for the current log call.
///
/// Implementations are consulted once per formatted event and must be safe
/// for concurrent reads; the formatter never writes through them.
pub trait CorrelationProvider: Send + Sync {
    /// The currently active trace id, if any.
    fn trace_id(&self) -> Option<String>;
}

/// Provider used when no tracer is wired up: never reports a trace id.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrelation;

impl CorrelationProvider for NoCorrelation {
    fn trace_id(&self) -> Option<String> {
        None
    }
}

impl<F> CorrelationProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn trace_id(&self) -> Option<String> {
        self()
    }
}

/// Process-level inputs shared by every formatting call.
///
/// Constructed once by the host application and handed to the
/// [`Formatter`](crate::formatter::Formatter); read-only afterwards.
#[derive(Clone)]
pub struct Context {
    host: Option<String>,
    source: Option<String>,
    correlation: Arc<dyn CorrelationProvider>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            host: None,
            source: None,
            correlation: Arc::new(NoCorrelation),
        }
    }

    /// Host name emitted as `host`.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Application identity emitted as `source`.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_correlation(mut self, provider: Arc<dyn CorrelationProvider>) -> Self {
        self.correlation = provider;
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn trace_id(&self) -> Option<String> {
        self.correlation.trace_id()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("host", &self.host)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
