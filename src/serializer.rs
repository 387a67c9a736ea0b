use std::io::Write;

use serde_json::Value;

use crate::document::Document;
use crate::formatter::FormatError;

/// Renders a [`Document`] as one compact JSON object.
///
/// Entries are written in document order. Members of nested objects whose
/// value is `null` are left out; array elements are kept as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn to_vec(&self, doc: &Document) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::with_capacity(256);
        self.write(doc, &mut out)?;
        Ok(out)
    }

    /// Stream `doc` into `writer`. Any failure is reported against the
    /// top-level key being written at the time; the enclosing braces report
    /// an empty key.
    pub fn write<W: Write>(&self, doc: &Document, writer: &mut W) -> Result<(), FormatError> {
        let mut first = true;
        raw(writer, b"{", "")?;
        for (key, value) in doc.iter() {
            if !first {
                raw(writer, b",", key)?;
            }
            first = false;

            serde_json::to_writer(&mut *writer, key).map_err(|e| FormatError::serialization(key, e))?;
            raw(writer, b":", key)?;
            serde_json::to_writer(&mut *writer, &without_nulls(value))
                .map_err(|e| FormatError::serialization(key, e))?;
        }
        raw(writer, b"}", "")
    }
}

fn raw<W: Write>(writer: &mut W, bytes: &[u8], key: &str) -> Result<(), FormatError> {
    writer
        .write_all(bytes)
        .map_err(|e| FormatError::serialization(key, e))
}

fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}
