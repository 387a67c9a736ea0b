use crate::event::{ExceptionInfo, Fields, LogEvent};
use crate::formatter::Formatter;
use chrono::Utc;
use serde_json::Value;
use std::error::Error;
use std::io::{self, Write};
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns every event into a [`LogEvent`],
/// formats it with a [`Formatter`] and writes one line per event.
///
/// Mapping from `tracing` data:
/// - event fields become the payload; dotted names nest, so
///   `http.status = 200` yields `{"http": {"status": 200}}`;
/// - the `message` field becomes the message and `duration_ms` the
///   duration;
/// - fields under `exception.` (`name`, `message`, `stack_trace`) or a
///   recorded `dyn Error` become the exception;
/// - fields of the enclosing spans become named tags, inner spans winning.
///
/// Formatting and write failures are counted and reported on stderr. They
/// are never emitted through `tracing`, which would feed back into this
/// layer.
pub struct JsonFormatLayer<W = fn() -> io::Stdout> {
    formatter: Formatter,
    make_writer: W,
    /// Events written successfully.
    pub written_events: Arc<AtomicU64>,
    /// Events dropped because formatting or writing failed.
    pub failed_events: Arc<AtomicU64>,
}

impl JsonFormatLayer {
    /// Layer writing to stdout.
    pub fn new(formatter: Formatter) -> Self {
        Self::with_writer(formatter, io::stdout)
    }
}

impl<W> JsonFormatLayer<W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    pub fn with_writer(formatter: Formatter, make_writer: W) -> Self {
        JsonFormatLayer {
            formatter,
            make_writer,
            written_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    fn emit(&self, event: &LogEvent) {
        let mut line = match self.formatter.format(event) {
            Ok(line) => line,
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("dropping log event: {}", e);
                return;
            }
        };
        line.push(b'\n');

        let mut writer = self.make_writer.make_writer();
        match writer.write_all(&line) {
            Ok(()) => {
                self.written_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("error writing log line: {}", e);
            }
        }
    }
}

/// Span fields stored in the registry's span extensions.
struct SpanTags(Fields);

impl<S, W> Layer<S> for JsonFormatLayer<W>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = Fields::new();
        let mut message = None;
        let mut exception = None;
        attrs.record(&mut FieldVisitor {
            fields: &mut fields,
            message: &mut message,
            exception: &mut exception,
        });
        span.extensions_mut().insert(SpanTags(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(SpanTags(fields)) = extensions.get_mut::<SpanTags>() {
            let mut message = None;
            let mut exception = None;
            values.record(&mut FieldVisitor {
                fields,
                message: &mut message,
                exception: &mut exception,
            });
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut payload = Fields::new();
        let mut message: Option<String> = None;
        let mut exception: Option<ExceptionInfo> = None;

        let mut visitor = FieldVisitor {
            fields: &mut payload,
            message: &mut message,
            exception: &mut exception,
        };
        event.record(&mut visitor);

        let mut named_tags = Fields::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanTags(fields)) = span.extensions().get::<SpanTags>() {
                    for (key, value) in fields {
                        named_tags.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        let meta = event.metadata();
        let mut record = LogEvent::at(Utc::now(), (*meta.level()).into()).with_name(meta.target());
        if let Some(message) = message {
            record = record.with_message(message);
        }
        if let Some(millis) = payload.shift_remove("duration_ms").as_ref().and_then(Value::as_f64) {
            record = record.with_duration_millis(millis);
        }
        if let Some(from_fields) = payload.shift_remove("exception").and_then(exception_from_fields) {
            exception.get_or_insert(from_fields);
        }
        if let Some(exception) = exception {
            record = record.with_exception(exception);
        }
        if !payload.is_empty() {
            record = record.with_payload(payload);
        }
        if !named_tags.is_empty() {
            record = record.with_named_tags(named_tags);
        }

        self.emit(&record);
    }
}

fn exception_from_fields(value: Value) -> Option<ExceptionInfo> {
    let Value::Object(map) = value else {
        return None;
    };
    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
    let name = text("name").unwrap_or_else(|| "Error".to_string());
    let message = text("message").unwrap_or_default();
    let frames: Vec<String> = match map.get("stack_trace") {
        Some(Value::String(s)) => s.lines().map(str::to_string).collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Some(ExceptionInfo::new(name, message).with_stack_trace(frames))
}

fn exception_from_error(name: &str, error: &(dyn Error + 'static)) -> ExceptionInfo {
    let exception = ExceptionInfo::new(name, error.to_string());
    match error.source() {
        Some(source) => exception.with_cause(exception_from_error("source", source)),
        None => exception,
    }
}

/// Insert `value` at a dotted `path`, creating intermediate objects and
/// replacing non-object values that sit in the way.
fn insert_path(fields: &mut Fields, path: &str, value: Value) {
    match path.split_once('.') {
        Some((head, rest)) if !head.is_empty() && !rest.is_empty() => {
            let slot = fields
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Fields::new()));
            if !slot.is_object() {
                *slot = Value::Object(Fields::new());
            }
            if let Value::Object(inner) = slot {
                insert_path(inner, rest, value);
            }
        }
        _ => {
            fields.insert(path.to_string(), value);
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Fields,
    pub message: &'a mut Option<String>,
    pub exception: &'a mut Option<ExceptionInfo>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            insert_path(self.fields, field.name(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        insert_path(self.fields, field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        insert_path(self.fields, field.name(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        insert_path(self.fields, field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        insert_path(self.fields, field.name(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        *self.exception = Some(exception_from_error(field.name(), value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            insert_path(self.fields, field.name(), Value::String(format!("{:?}", value)));
        }
    }
}
