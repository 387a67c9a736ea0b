use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Ordered string-keyed mapping used for payloads and named tags.
pub type Fields = Map<String, Value>;

/// Severity of a [`LogEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Structured error attached to a log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionInfo {
    /// Error kind, e.g. a type name.
    pub name: String,
    pub message: String,
    pub stack_trace: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionInfo {
            name: name.into(),
            message: message.into(),
            stack_trace: Vec::new(),
            cause: None,
        }
    }

    pub fn with_stack_trace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stack_trace = frames.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cause(mut self, cause: ExceptionInfo) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Immutable snapshot of one log line as handed over by the logging
/// facility.
///
/// Events are assembled once through the `with_*` builders and are only
/// read afterwards; nothing in this crate mutates a payload or named-tag
/// mapping it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    timestamp: DateTime<Utc>,
    level: Level,
    name: Option<String>,
    message: Option<String>,
    duration_millis: Option<f64>,
    payload: Option<Fields>,
    named_tags: Option<Fields>,
    exception: Option<ExceptionInfo>,
}

impl LogEvent {
    /// New event stamped with the current time.
    pub fn new(level: Level) -> Self {
        Self::at(Utc::now(), level)
    }

    pub fn at(timestamp: DateTime<Utc>, level: Level) -> Self {
        LogEvent {
            timestamp,
            level,
            name: None,
            message: None,
            duration_millis: None,
            payload: None,
            named_tags: None,
            exception: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_duration_millis(mut self, millis: f64) -> Self {
        self.duration_millis = Some(millis);
        self
    }

    pub fn with_payload(mut self, payload: Fields) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_named_tags(mut self, tags: Fields) -> Self {
        self.named_tags = Some(tags);
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn duration_millis(&self) -> Option<f64> {
        self.duration_millis
    }

    pub fn payload(&self) -> Option<&Fields> {
        self.payload.as_ref()
    }

    /// Payload entry for `key`, `None` when the payload or the key is absent.
    pub fn payload_value(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|p| p.get(key))
    }

    pub fn named_tags(&self) -> Option<&Fields> {
        self.named_tags.as_ref()
    }

    pub fn named_tag(&self, key: &str) -> Option<&Value> {
        self.named_tags.as_ref().and_then(|t| t.get(key))
    }

    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.exception.as_ref()
    }
}
