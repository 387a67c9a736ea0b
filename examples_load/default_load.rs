use std::time::Instant;

use serde_json::json;
use tracing_datadog_format::context::Context;
use tracing_datadog_format::event::{Level, LogEvent};
use tracing_datadog_format::formatter::Formatter;

fn main() {
    let formatter = Formatter::datadog(Context::new().with_host("load-test"));

    let mut payload = serde_json::Map::new();
    payload.insert("category".into(), json!("http_inbound"));
    payload.insert("http".into(), json!({"status": 200, "method": "GET"}));
    payload.insert("session_info".into(), json!({"user": "u1", "user_uid": "42"}));
    payload.insert("path".into(), json!("/orders"));

    let event = LogEvent::new(Level::Info)
        .with_message("default load test request")
        .with_duration_millis(3.5)
        .with_payload(payload);

    let n: u64 = 100_000;
    let mut bytes = 0usize;
    let start = Instant::now();

    for _ in 0..n {
        match formatter.format(&event) {
            Ok(line) => bytes += line.len(),
            Err(e) => eprintln!("format failed: {}", e),
        }
    }

    let elapsed = start.elapsed();
    println!("default config: formatted {} events ({} bytes) in {:?} (~{:.0} ev/s)",
        n,
        bytes,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
