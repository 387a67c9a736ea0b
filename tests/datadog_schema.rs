use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::TimeZone;
use serde_json::{json, Map, Value};
use tracing_datadog_format::context::Context;
use tracing_datadog_format::datadog::DEBUG_TRACE_ID_KEY;
use tracing_datadog_format::event::{ExceptionInfo, Fields, Level, LogEvent};
use tracing_datadog_format::formatter::Formatter;

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn event(level: Level) -> LogEvent {
    let ts = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    LogEvent::at(ts, level)
}

fn render(formatter: &Formatter, event: &LogEvent) -> Map<String, Value> {
    let bytes = formatter.format(event).unwrap();
    match serde_json::from_slice(&bytes).unwrap() {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn keys(doc: &Map<String, Value>) -> BTreeSet<&str> {
    doc.keys().map(String::as_str).collect()
}

fn set<'a>(items: &[&'a str]) -> BTreeSet<&'a str> {
    items.iter().copied().collect()
}

#[test]
fn scenario_a_plain_info_line() {
    let formatter = Formatter::datadog(Context::new());
    let doc = render(&formatter, &event(Level::Info).with_payload(Fields::new()));

    assert_eq!(doc["level"], "info");
    assert_eq!(doc["date"], "2024-03-01T08:00:00.000Z");
    assert_eq!(doc["category"], "source_code");
    assert_eq!(keys(&doc), set(&["date", "level", "category", DEBUG_TRACE_ID_KEY]));
}

#[test]
fn scenario_b_http_inbound() {
    let formatter = Formatter::datadog(Context::new());
    let payload = fields(json!({"category": "http_inbound", "http": {"status": 200}}));
    let doc = render(&formatter, &event(Level::Info).with_payload(payload));

    assert_eq!(doc["category"], "http_inbound");
    assert_eq!(doc["http"], json!({"status": 200}));
    assert!(!doc.contains_key("context"));
}

#[test]
fn scenario_c_user_from_session() {
    let formatter = Formatter::datadog(Context::new());
    let payload = fields(json!({"session_info": {"user": "u1", "user_uid": "42"}}));
    let doc = render(&formatter, &event(Level::Info).with_payload(payload));

    assert_eq!(doc["usr"], json!({"id": "u1", "uid": "42"}));
    assert!(!doc.contains_key("context"));
}

#[test]
fn scenario_d_kafka_job() {
    let formatter = Formatter::datadog(Context::new());
    let tags = fields(json!({"kafka_message_key": "k1", "topic": "t1", "component": "svc"}));
    let doc = render(&formatter, &event(Level::Info).with_named_tags(tags));

    assert_eq!(
        doc["job"],
        json!({"id": "k1", "system": "kafka", "channel": "t1", "component": "svc"})
    );
}

#[test]
fn exception_category_beats_payload_category() {
    let formatter = Formatter::datadog(Context::new());
    for category in ["http_inbound", "http_outbound", "billing"] {
        let event = event(Level::Error)
            .with_payload(fields(json!({"category": category, "http": {"status": 500}})))
            .with_exception(ExceptionInfo::new("Timeout", "upstream"));
        let doc = render(&formatter, &event);
        assert_eq!(doc["category"], "exception");
        assert_eq!(doc["exception"]["name"], "Timeout");
    }
}

#[test]
fn http_requires_both_category_and_entry() {
    let formatter = Formatter::datadog(Context::new());
    let cases = [
        (json!({"category": "http_inbound", "http": {"status": 200}}), true),
        (json!({"category": "http_outbound", "http": {"status": 502}}), true),
        (json!({"category": "http_inbound"}), false),
        (json!({"category": "billing", "http": {"status": 200}}), false),
        (json!({"http": {"status": 200}}), false),
    ];
    for (payload, expected) in cases {
        let doc = render(&formatter, &event(Level::Info).with_payload(fields(payload.clone())));
        assert_eq!(doc.contains_key("http"), expected, "payload {payload}");
    }
}

#[test]
fn context_never_repeats_handled_keys() {
    let formatter = Formatter::datadog(Context::new());
    let payload = fields(json!({
        "session_info": {"user": "u1"},
        "category": "http_outbound",
        "http": {"method": "GET"},
        "retry": 2,
        "target": "billing-api"
    }));
    let doc = render(&formatter, &event(Level::Warn).with_payload(payload));

    let context = doc["context"].as_object().unwrap();
    assert_eq!(context.keys().cloned().collect::<Vec<_>>(), vec!["retry", "target"]);
}

#[test]
fn usr_requires_session_and_identity() {
    let formatter = Formatter::datadog(Context::new());
    let cases = [
        (json!({"session_info": {"user": "u1"}}), true),
        (json!({"session_info": {"user_uid": 7}}), true),
        (json!({"session_info": {"user": "", "user_uid": null, "admin": "a"}}), false),
        (json!({"session_info": {}}), false),
        (json!({"session_info": null}), false),
        (json!({}), false),
    ];
    for (payload, expected) in cases {
        let doc = render(&formatter, &event(Level::Info).with_payload(fields(payload.clone())));
        assert_eq!(doc.contains_key("usr"), expected, "payload {payload}");
    }
}

#[test]
fn active_job_branch_carries_args() {
    let formatter = Formatter::datadog(Context::new());
    let tags = fields(json!({
        "que_job_id": "j-9",
        "queue": "mailers",
        "component": "worker",
        "args": ["welcome", 42],
        "kafka_message_key": "ignored"
    }));
    let doc = render(&formatter, &event(Level::Info).with_named_tags(tags));

    assert_eq!(
        doc["job"],
        json!({
            "id": "j-9",
            "system": "active_job",
            "channel": "mailers",
            "component": "worker",
            "args": ["welcome", 42]
        })
    );
}

#[test]
fn trace_id_only_when_active() {
    let idle = Formatter::datadog(Context::new());
    assert!(!render(&idle, &event(Level::Info)).contains_key("dd.trace_id"));

    let traced = Formatter::datadog(
        Context::new().with_correlation(Arc::new(|| Some("5550123".to_string()))),
    );
    let doc = render(&traced, &event(Level::Info));
    assert_eq!(doc["dd.trace_id"], "5550123");
    let debug = doc[DEBUG_TRACE_ID_KEY].as_u64().unwrap();
    assert!((1..=100).contains(&debug));
}

#[test]
fn formatting_is_idempotent_apart_from_debug_trace_id() {
    let formatter = Formatter::datadog(Context::new().with_host("web-1"));
    let event = event(Level::Info)
        .with_message("checkout")
        .with_duration_millis(3.25)
        .with_payload(fields(json!({"cart": {"items": 3, "coupon": null}})));

    let mut first = render(&formatter, &event);
    let mut second = render(&formatter, &event);
    first.remove(DEBUG_TRACE_ID_KEY);
    second.remove(DEBUG_TRACE_ID_KEY);
    assert_eq!(first, second);
    assert_eq!(first["context"], json!({"cart": {"items": 3}}));
}

#[test]
fn key_order_follows_pipeline() {
    let formatter = Formatter::datadog(Context::new().with_host("web-1").with_source("ATS"));
    let event = event(Level::Error)
        .with_message("payment failed")
        .with_duration_millis(10.0)
        .with_payload(fields(json!({
            "category": "http_outbound",
            "http": {"status": 503},
            "session_info": {"user": "u1"},
            "gateway": "stripe"
        })))
        .with_named_tags(fields(json!({"que_job_id": 1})))
        .with_exception(ExceptionInfo::new("GatewayError", "503"));

    let doc = render(&formatter, &event);
    let order: Vec<&str> = doc.keys().map(String::as_str).collect();
    assert_eq!(
        order,
        vec![
            "date",
            "host",
            "source",
            "level",
            "category",
            "duration_ms",
            "job",
            "message",
            "context",
            "exception",
            "dd.debug_trace_id",
            "usr",
        ]
    );
}

#[test]
fn output_is_single_compact_object() {
    let formatter = Formatter::datadog(Context::new());
    let bytes = formatter.format(&event(Level::Debug).with_message("a b")).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("{\"date\":"));
    assert!(text.ends_with('}'));
    assert!(!text.contains('\n'));
    assert!(!text.contains("null"));
}

#[test]
fn falsy_payload_entries_count_as_absent() {
    let formatter = Formatter::datadog(Context::new());

    let doc = render(&formatter, &event(Level::Info).with_payload(fields(json!({"a": null}))));
    assert!(!doc.contains_key("context"));

    let doc = render(&formatter, &event(Level::Info).with_payload(fields(json!({"category": false}))));
    assert_eq!(doc["category"], "source_code");
    assert!(!doc.contains_key("context"));
}
