use std::io;
use std::time::Instant;
use tracing::{error, info_span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use tracing_datadog_format::formatter::{FormatConfig, Formatter};
use tracing_datadog_format::layer::JsonFormatLayer;

fn main() {
    let config = FormatConfig {
        time_key: Some("@timestamp".to_string()),
        source: Some("load-test".to_string()),
        ..FormatConfig::datadog()
    };
    let formatter = Formatter::from_config(&config, config.context());

    // Discard output so only formatting cost is measured.
    let layer = JsonFormatLayer::with_writer(formatter, io::sink);
    let written = layer.written_events.clone();
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    let span = info_span!("consumer", kafka_message_key = "k1", topic = "orders");
    let _guard = span.enter();
    for i in 0..n {
        error!(iteration = i, category = "source_code", "custom load test error");
    }

    let elapsed = start.elapsed();
    println!("custom config: wrote {} events in {:?} (~{:.0} ev/s)",
        written.load(std::sync::atomic::Ordering::Relaxed),
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
