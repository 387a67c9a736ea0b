use crate::context::Context;
use crate::formatter::{FormatConfig, Formatter};
use crate::layer::JsonFormatLayer;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Install a global `tracing` subscriber that writes one JSON line per
/// event to stdout.
///
/// **Parameters**
/// - `config`: [`FormatConfig`] choosing between the Datadog and the
///   generic schema, plus time key and identity overrides.
/// - `ctx`: [`Context`] supplying the trace correlation provider. Host and
///   source set in `config` are applied on top of it.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`JsonFormatLayer`] as the
/// global default subscriber, so all `tracing` events in the process are
/// formatted by the layer.
pub fn init_tracing_with_config(config: &FormatConfig, ctx: Context) -> Result<(), SetGlobalDefaultError> {
    let ctx = config.apply_identity(ctx);
    let layer = JsonFormatLayer::new(Formatter::from_config(config, ctx));
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)
}

/// Initialize tracing from the environment.
///
/// **Behavior**
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`FormatConfig::from_env`] and a [`Context`] without trace correlation.
/// This is the recommended entrypoint for typical microservices; the
/// environment is read exactly once, here.
pub fn init_tracing() -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(&FormatConfig::from_env(), Context::new())
}
