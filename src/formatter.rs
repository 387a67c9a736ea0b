use std::error::Error;
use std::io::Write;

use crate::context::Context;
use crate::datadog;
use crate::document::Document;
use crate::env::{
    env_flag, env_opt, DATADOG_LOG_FORMAT_ENABLED_ENV, LOG_FORMAT_HOST_ENV, LOG_FORMAT_SOURCE_ENV,
    LOG_FORMAT_TIME_KEY_ENV,
};
use crate::event::LogEvent;
use crate::pipeline::{ExtractorPipeline, GENERIC_TIME_KEY};
use crate::serializer::JsonSerializer;

/// The only way a formatting call can fail.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// A value could not be rendered or written. `key` is the top-level
    /// document key in flight, empty for the enclosing object.
    #[error("failed to serialize log field `{key}`: {source}")]
    Serialization {
        key: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl FormatError {
    pub fn serialization(key: &str, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        FormatError::Serialization {
            key: key.to_string(),
            source: source.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            FormatError::Serialization { key, .. } => key,
        }
    }
}

/// Construction-time options of a [`Formatter`].
///
/// **Fields**
/// - `enabled`: select the Datadog schema; when `false` the generic schema
///   is used so the host keeps emitting plain structured JSON.
/// - `time_key`: output key of the event time. `None` keeps the schema
///   default (`date` for Datadog, `timestamp` for generic).
/// - `host`, `source`: process identity copied into every document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatConfig {
    pub enabled: bool,
    pub time_key: Option<String>,
    pub host: Option<String>,
    pub source: Option<String>,
}

impl FormatConfig {
    /// Datadog schema with default keys.
    pub fn datadog() -> Self {
        FormatConfig {
            enabled: true,
            ..Self::default()
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Meant to be called once at start-up; the formatter never looks at
    /// the environment again.
    pub fn from_env() -> Self {
        FormatConfig {
            enabled: env_flag(DATADOG_LOG_FORMAT_ENABLED_ENV),
            time_key: env_opt(LOG_FORMAT_TIME_KEY_ENV),
            host: env_opt(LOG_FORMAT_HOST_ENV),
            source: env_opt(LOG_FORMAT_SOURCE_ENV),
        }
    }

    pub fn time_key(&self) -> &str {
        match &self.time_key {
            Some(key) => key.as_str(),
            None if self.enabled => datadog::DEFAULT_TIME_KEY,
            None => GENERIC_TIME_KEY,
        }
    }

    /// Context carrying the configured identity and no trace correlation.
    pub fn context(&self) -> Context {
        self.apply_identity(Context::new())
    }

    /// Copy the configured host and source onto `ctx`, keeping its
    /// correlation provider.
    pub fn apply_identity(&self, ctx: Context) -> Context {
        let mut ctx = ctx;
        if let Some(host) = &self.host {
            ctx = ctx.with_host(host.as_str());
        }
        if let Some(source) = &self.source {
            ctx = ctx.with_source(source.as_str());
        }
        ctx
    }

    pub fn pipeline(&self) -> ExtractorPipeline {
        if self.enabled {
            datadog::pipeline(self.time_key())
        } else {
            ExtractorPipeline::generic(self.time_key())
        }
    }
}

/// Turns one [`LogEvent`] into one JSON document.
///
/// A formatter holds no per-call state: every call gets its own
/// [`Document`], so a single instance can be shared across threads.
#[derive(Debug)]
pub struct Formatter {
    pipeline: ExtractorPipeline,
    ctx: Context,
    serializer: JsonSerializer,
}

impl Formatter {
    pub fn new(pipeline: ExtractorPipeline, ctx: Context) -> Self {
        Formatter {
            pipeline,
            ctx,
            serializer: JsonSerializer,
        }
    }

    /// Datadog formatter with default keys.
    pub fn datadog(ctx: Context) -> Self {
        Self::new(datadog::default_pipeline(), ctx)
    }

    /// Formatter selected by `config`, using `ctx` for identity and trace
    /// correlation.
    pub fn from_config(config: &FormatConfig, ctx: Context) -> Self {
        Self::new(config.pipeline(), ctx)
    }

    pub fn pipeline(&self) -> &ExtractorPipeline {
        &self.pipeline
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Run the pipeline without serializing.
    pub fn document(&self, event: &LogEvent) -> Document {
        let mut doc = Document::new();
        self.pipeline.apply(event, &self.ctx, &mut doc);
        doc
    }

    pub fn format(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError> {
        self.serializer.to_vec(&self.document(event))
    }

    /// Like [`Formatter::format`], writing straight into `writer`. No
    /// framing is added.
    pub fn format_to<W: Write>(&self, event: &LogEvent, writer: &mut W) -> Result<(), FormatError> {
        self.serializer.write(&self.document(event), writer)
    }
}
