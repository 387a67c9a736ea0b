use std::fmt;

use crate::context::Context;
use crate::document::Document;
use crate::event::LogEvent;
use crate::extractor::{
    Duration, Exception, FieldExtractor, Host, LevelField, LoggerName, Message, Payload, Timestamp,
};

/// Time key of the generic schema.
pub const GENERIC_TIME_KEY: &str = "timestamp";

/// Ordered list of [`FieldExtractor`]s applied to every event.
///
/// Extractors run synchronously in list order. Because [`Document::insert`]
/// never overwrites, an earlier extractor wins a key it shares with a later
/// one unless the later one calls [`Document::replace`]; list order is the
/// override precedence.
pub struct ExtractorPipeline {
    extractors: Vec<Box<dyn FieldExtractor>>,
}

impl ExtractorPipeline {
    /// Pipeline with no extractors.
    pub fn empty() -> Self {
        ExtractorPipeline { extractors: Vec::new() }
    }

    /// Schema-neutral pipeline: time, host, level, name, duration, message,
    /// payload, exception.
    pub fn generic(time_key: &str) -> Self {
        let mut pipeline = Self::empty();
        pipeline.push(Timestamp::new(time_key));
        pipeline.push(Host);
        pipeline.push(LevelField);
        pipeline.push(LoggerName);
        pipeline.push(Duration);
        pipeline.push(Message);
        pipeline.push(Payload);
        pipeline.push(Exception);
        pipeline
    }

    pub fn push(&mut self, extractor: impl FieldExtractor + 'static) -> &mut Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Insert right after the extractor called `anchor`, or at the end when
    /// there is none.
    pub fn insert_after(&mut self, anchor: &str, extractor: impl FieldExtractor + 'static) -> &mut Self {
        let at = self
            .position(anchor)
            .map_or(self.extractors.len(), |index| index + 1);
        self.extractors.insert(at, Box::new(extractor));
        self
    }

    /// Swap the extractor called `name` for `extractor` in place. Returns
    /// `false` and leaves the pipeline unchanged when `name` is unknown.
    pub fn replace(&mut self, name: &str, extractor: impl FieldExtractor + 'static) -> bool {
        match self.position(name) {
            Some(index) => {
                self.extractors[index] = Box::new(extractor);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.extractors.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    pub fn apply(&self, event: &LogEvent, ctx: &Context, doc: &mut Document) {
        for extractor in &self.extractors {
            extractor.extract(event, ctx, doc);
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.extractors.iter().position(|e| e.name() == name)
    }
}

impl fmt::Debug for ExtractorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
