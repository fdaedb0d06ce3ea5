//! Purpose: Value model for the restricted JSON dialect used by the test-module endpoints.
//! Exports: `JsonValue`, `JsonDocument`.
//! Role: Ordered key/value container handed from the decoder to request handlers.
//! Invariants: Keys are unique; inserting an existing key replaces its value in place.
//! Invariants: Iteration order is first-insertion order.

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JsonValue {
    String(String),
    Integer(i64),
    StringArray(Vec<String>),
}

impl JsonValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            JsonValue::StringArray(values) => Some(values),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JsonValue::String(_) => "string",
            JsonValue::Integer(_) => "integer",
            JsonValue::StringArray(_) => "string-array",
        }
    }
}

impl From<&str> for JsonValue {
    fn from(value: &str) -> Self {
        JsonValue::String(value.to_string())
    }
}

impl From<String> for JsonValue {
    fn from(value: String) -> Self {
        JsonValue::String(value)
    }
}

impl From<i64> for JsonValue {
    fn from(value: i64) -> Self {
        JsonValue::Integer(value)
    }
}

impl From<Vec<String>> for JsonValue {
    fn from(values: Vec<String>) -> Self {
        JsonValue::StringArray(values)
    }
}

/// Documents are small (a handful of keys per request), so lookups are linear.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonDocument {
    entries: Vec<(String, JsonValue)>,
}

impl JsonDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replaced value when `key` was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        let key = key.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(JsonValue::as_i64)
    }

    pub fn get_string_array(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(JsonValue::as_string_array)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, JsonValue)> for JsonDocument {
    fn from_iter<I: IntoIterator<Item = (K, JsonValue)>>(iter: I) -> Self {
        let mut doc = JsonDocument::new();
        for (key, value) in iter {
            doc.insert(key, value);
        }
        doc
    }
}
