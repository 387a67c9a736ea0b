//! Extractors and pipeline for the Datadog log schema.
//!
//! The Datadog pipeline is the generic one with a handful of rules swapped
//! in: a `date` time key, a `category` classification, dedicated `http`,
//! `job` and `usr` objects, payload leftovers under `context` and trace
//! correlation fields.

use rand::Rng;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::document::Document;
use crate::event::LogEvent;
use crate::extractor::{self, FieldExtractor};
use crate::pipeline::ExtractorPipeline;
use crate::value::{member, non_null, Presence};

pub const DEFAULT_TIME_KEY: &str = "date";

pub const CATEGORY_HTTP_INBOUND: &str = "http_inbound";
pub const CATEGORY_HTTP_OUTBOUND: &str = "http_outbound";
pub const CATEGORY_EXCEPTION: &str = "exception";
pub const CATEGORY_SOURCE_CODE: &str = "source_code";

/// Payload keys that have their own extractor and never show up in `context`.
pub const HANDLED_PAYLOAD_KEYS: [&str; 3] = ["session_info", "category", "http"];

pub const TRACE_ID_KEY: &str = "dd.trace_id";
/// Random value in `1..=100` written on every call. It is a sampling
/// diagnostic, not an identifier, and makes otherwise identical documents
/// differ.
pub const DEBUG_TRACE_ID_KEY: &str = "dd.debug_trace_id";

/// Build the Datadog pipeline on top of the generic one.
///
/// Resulting order: time, host, level, category, duration, http, job,
/// message, context, exception, trace correlation, user. No two of these
/// write the same key, so the order only matters for readability of the
/// output. Anyone adding an extractor that shares a key with an earlier one
/// must place it after that one and use [`Document::replace`].
pub fn pipeline(time_key: &str) -> ExtractorPipeline {
    let mut pipeline = ExtractorPipeline::generic(time_key);
    pipeline.remove(extractor::LoggerName::NAME);
    pipeline.replace(extractor::Payload::NAME, ContextFields);
    pipeline.insert_after(extractor::LevelField::NAME, Category);
    pipeline.insert_after(extractor::Duration::NAME, Http);
    pipeline.insert_after(Http::NAME, Job);
    pipeline.push(TraceCorrelation);
    pipeline.push(User);
    pipeline
}

/// Datadog pipeline with the default `date` time key.
pub fn default_pipeline() -> ExtractorPipeline {
    pipeline(DEFAULT_TIME_KEY)
}

/// Category of an event: exception first, then the payload's own
/// `category` unless it is `null` or `false`, then `source_code`.
pub fn resolve_category(event: &LogEvent) -> Value {
    if event.exception().is_some() {
        return Value::from(CATEGORY_EXCEPTION);
    }
    non_null(event.payload_value("category"))
        .filter(|category| !matches!(category, Value::Bool(false)))
        .unwrap_or_else(|| Value::from(CATEGORY_SOURCE_CODE))
}

fn is_http_category(event: &LogEvent) -> bool {
    matches!(
        resolve_category(event).as_str(),
        Some(CATEGORY_HTTP_INBOUND) | Some(CATEGORY_HTTP_OUTBOUND)
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Category;

impl Category {
    pub const NAME: &'static str = "category";
}

impl FieldExtractor for Category {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        doc.insert("category", resolve_category(event));
    }
}

/// Payload minus [`HANDLED_PAYLOAD_KEYS`] under `context`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextFields;

impl ContextFields {
    pub const NAME: &'static str = "context";
}

impl FieldExtractor for ContextFields {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        let Some(payload) = event.payload() else {
            return;
        };
        let rest: Map<String, Value> = payload
            .iter()
            .filter(|(key, value)| !value.is_null() && !HANDLED_PAYLOAD_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if !rest.is_empty() {
            doc.insert("context", Value::Object(rest));
        }
    }
}

/// `http` payload entry, only when the event resolves to an inbound or
/// outbound HTTP category. Exceptions therefore never carry `http`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Http;

impl Http {
    pub const NAME: &'static str = "http";
}

impl FieldExtractor for Http {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        if !is_http_category(event) {
            return;
        }
        if let Some(http) = non_null(event.payload_value("http")) {
            doc.insert("http", http);
        }
    }
}

/// `usr` object built from the payload's `session_info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct User;

impl User {
    pub const NAME: &'static str = "user";
}

impl FieldExtractor for User {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        let session = event.payload_value("session_info");
        if session.is_blank() {
            return;
        }

        let user = member(session, "user");
        let user_uid = member(session, "user_uid");
        if user.is_blank() && user_uid.is_blank() {
            return;
        }

        let mut usr = Map::new();
        if let Some(id) = non_null(user) {
            usr.insert("id".into(), id);
        }
        if let Some(uid) = non_null(user_uid) {
            usr.insert("uid".into(), uid);
        }
        for (source, target) in [("admin", "admin_id"), ("account_subdomain", "account_subdomain")] {
            let value = member(session, source);
            if value.is_present() {
                usr.insert(target.into(), value.cloned().unwrap_or_default());
            }
        }
        doc.insert("usr", Value::Object(usr));
    }
}

/// `job` object for events emitted from a background job or a Kafka
/// consumer, read from the named tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Job;

impl Job {
    pub const NAME: &'static str = "job";
}

impl FieldExtractor for Job {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, event: &LogEvent, _ctx: &Context, doc: &mut Document) {
        if event.named_tags().is_blank() {
            return;
        }

        let tag = |key: &str| non_null(event.named_tag(key));
        let mut job = Map::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                job.insert(key.into(), value);
            }
        };

        if event.named_tag("que_job_id").is_present() {
            put("id", tag("que_job_id"));
            put("system", Some(Value::from("active_job")));
            put("channel", tag("queue"));
            put("component", tag("component"));
            put("args", tag("args"));
        } else if event.named_tag("kafka_message_key").is_present() {
            put("id", tag("kafka_message_key"));
            put("system", Some(Value::from("kafka")));
            put("channel", tag("topic"));
            put("component", tag("component"));
        } else {
            return;
        }

        doc.insert("job", Value::Object(job));
    }
}

/// `dd.trace_id` from the correlation provider plus the per-call
/// `dd.debug_trace_id` diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceCorrelation;

impl TraceCorrelation {
    pub const NAME: &'static str = "trace_correlation";
}

impl FieldExtractor for TraceCorrelation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(&self, _event: &LogEvent, ctx: &Context, doc: &mut Document) {
        if let Some(trace_id) = ctx.trace_id().filter(|id| !id.trim().is_empty()) {
            doc.insert(TRACE_ID_KEY, trace_id);
        }
        let debug_id: u8 = rand::thread_rng().gen_range(1..=100);
        doc.insert(DEBUG_TRACE_ID_KEY, debug_id);
    }
}
