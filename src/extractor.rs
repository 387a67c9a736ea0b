//! Field extractors shared by every output schema.
//!
//! An extractor derives zero or more top-level fields from a [`LogEvent`]
//! and the process [`Context`]. Absent or blank inputs are ordinary control
//! flow: an extractor that has nothing to say simply writes nothing.

use chrono::SecondsFormat;
use serde_json::{Number, Value};

use crate::context::Context;
use crate::document::Document;
use crate::event::LogEvent;

/// One enrichment rule applied by an [`ExtractorPipeline`](crate::pipeline::ExtractorPipeline).
pub trait FieldExtractor: Send + Sync {
    /// Stable identifier used to locate the extractor inside a pipeline.
    fn name(&self) -> &'static str;

    fn extract(&self, event: &LogEvent, ctx: &Context, doc: &mut Document);
}

/// Event time as ISO-8601 UTC with millisecond precision.
#[derive(Debug, Clone)]
pub struct Timestamp {
    key: String,
}

impl Timestamp {
    pub const NAME: &'static str = "time";

    pub fn new(key: impl Into<String>) -> Self {
        Timestamp { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl FieldExtractor for Timestamp {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        let rendered = event.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true);
        doc.insert(self.key.as_str(), rendered);
    }
}

/// `host` and `source` from the process identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Host;

impl Host {
    pub const NAME: &'static str = "host";
}

impl FieldExtractor for Host {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, _event: &LogEvent, ctx: &Context, doc: &mut Document) {
        if let Some(host) = ctx.host() {
            doc.insert("host", host);
        }
        if let Some(source) = ctx.source() {
            doc.insert("source", source);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LevelField;

impl LevelField {
    pub const NAME: &'static str = "level";
}

impl FieldExtractor for LevelField {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        doc.insert("level", event.level().as_str());
    }
}

/// `duration_ms`, copied verbatim.
///
/// JSON has no representation for NaN or infinities, so non-finite
/// durations count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Duration;

impl Duration {
    pub const NAME: &'static str = "duration";
}

impl FieldExtractor for Duration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        if let Some(number) = event.duration_millis().and_then(Number::from_f64) {
            doc.insert("duration_ms", number);
        }
    }
}

/// Logger name (the `tracing` target) under `name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerName;

impl LoggerName {
    pub const NAME: &'static str = "name";
}

impl FieldExtractor for LoggerName {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        if let Some(name) = event.name() {
            doc.insert("name", name);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Message;

impl Message {
    pub const NAME: &'static str = "message";
}

impl FieldExtractor for Message {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        if let Some(message) = event.message() {
            doc.insert("message", message);
        }
    }
}

/// Raw payload under `payload`, used by the generic schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload;

impl Payload {
    pub const NAME: &'static str = "payload";
}

impl FieldExtractor for Payload {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        match event.payload() {
            Some(payload) if !payload.is_empty() => {
                doc.insert("payload", Value::Object(payload.clone()));
            }
            _ => {}
        }
    }
}

/// `exception = {name, message, stack_trace, cause}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exception;

impl Exception {
    pub const NAME: &'static str = "exception";
}

impl FieldExtractor for Exception {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        if let Some(Ok(value)) = event.exception().map(serde_json::to_value) {
            doc.insert("exception", value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ExceptionInfo, Fields, Level};
    use chrono::TimeZone;
    use serde_json::json;

    fn event() -> LogEvent {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        LogEvent::at(ts, Level::Info)
    }

    fn run(extractor: &dyn FieldExtractor, event: &LogEvent, ctx: &Context) -> Document {
        let mut doc = Document::new();
        extractor.extract(event, ctx, &mut doc);
        doc
    }

    #[test]
    fn timestamp_uses_millisecond_precision_and_configured_key() {
        let doc = run(&Timestamp::new("date"), &event(), &Context::new());
        assert_eq!(doc.get("date"), Some(&json!("2024-01-15T10:30:00.123Z")));
    }

    #[test]
    fn host_writes_only_known_identity() {
        let doc = run(&Host, &event(), &Context::new());
        assert!(doc.is_empty());

        let doc = run(&Host, &event(), &Context::new().with_host("web-1").with_source("ATS"));
        assert_eq!(doc.get("host"), Some(&json!("web-1")));
        assert_eq!(doc.get("source"), Some(&json!("ATS")));
    }

    #[test]
    fn duration_is_optional_and_verbatim() {
        let ctx = Context::new();
        assert!(!run(&Duration, &event(), &ctx).contains_key("duration_ms"));

        let doc = run(&Duration, &event().with_duration_millis(12.5), &ctx);
        assert_eq!(doc.get("duration_ms"), Some(&json!(12.5)));

        let doc = run(&Duration, &event().with_duration_millis(f64::NAN), &ctx);
        assert!(!doc.contains_key("duration_ms"));
    }

    #[test]
    fn payload_skips_empty_maps() {
        let ctx = Context::new();
        let doc = run(&Payload, &event().with_payload(Fields::new()), &ctx);
        assert!(doc.is_empty());
    }

    #[test]
    fn exception_nests_cause() {
        let exc = ExceptionInfo::new("Outer", "boom")
            .with_stack_trace(["src/main.rs:10"])
            .with_cause(ExceptionInfo::new("Inner", "root"));
        let doc = run(&Exception, &event().with_exception(exc), &Context::new());
        assert_eq!(
            doc.get("exception"),
            Some(&json!({
                "name": "Outer",
                "message": "boom",
                "stack_trace": ["src/main.rs:10"],
                "cause": {"name": "Inner", "message": "root", "stack_trace": []}
            }))
        );
    }
}
