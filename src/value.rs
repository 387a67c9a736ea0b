use serde_json::{Map, Value};

/// Presence checks over loosely-typed payload values.
///
/// Payload and named-tag values arrive as [`serde_json::Value`], which
/// already is a closed set of cases (null, bool, number, string, array,
/// object). An absent key is modelled as `None`. Extractors use these
/// predicates instead of probing value types ad hoc.
pub trait Presence {
    /// `true` for absent, `null`, `false`, whitespace-only strings and empty
    /// arrays or objects.
    fn is_blank(&self) -> bool;

    fn is_present(&self) -> bool {
        !self.is_blank()
    }
}

impl Presence for Value {
    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(_) => false,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
        }
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_blank(&self) -> bool {
        self.as_ref().map_or(true, Presence::is_blank)
    }
}

impl<T: Presence + ?Sized> Presence for &T {
    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

impl Presence for Map<String, Value> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Look up `key` in `value` when it is an object. Non-object values have no
/// members.
pub fn member<'a>(value: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    value.and_then(Value::as_object).and_then(|map| map.get(key))
}

/// Clone `value` unless it is `null`; absent and `null` both yield `None`.
pub fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}
