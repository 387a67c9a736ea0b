use serde_json::{Map, Value};

/// Ordered accumulator that extractors write into during one formatting
/// call.
///
/// Keys keep their insertion order so emitted JSON diffs cleanly between
/// versions. `null` is never stored: writing `null` is the same as writing
/// nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `key` if it is not set yet.
    ///
    /// Returns `false` when nothing was stored: either the key already
    /// holds a value, which is left untouched, or `value` is `null`. Use
    /// [`Document::replace`] for an intended override.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();
        if value.is_null() || self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    /// Overwrite `key`, keeping its original position. Writing `null`
    /// removes the key.
    pub fn replace(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if value.is_null() {
            self.entries.shift_remove(&key)
        } else {
            self.entries.insert(key, value)
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.entries
    }
}
