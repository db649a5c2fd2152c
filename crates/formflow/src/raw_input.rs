// File: src/raw_input.rs
// Purpose: Untyped submitted values, keyed by field name

use crate::value::UploadedFile;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// One submitted value before validation
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    /// Repeated keys, e.g. a multi-select
    List(Vec<String>),
    File(UploadedFile),
}

impl RawValue {
    /// Missing, blank text, or an empty list
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Text(s) => s.is_empty(),
            RawValue::List(items) => items.iter().all(|item| item.is_empty()),
            RawValue::File(file) => file.filename.is_empty(),
        }
    }

    /// Text as submitted; a list yields its last entry, like a plain form read
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::List(items) => items.last().map(String::as_str),
            RawValue::File(_) => None,
        }
    }
}

/// Submitted form data for one request
///
/// All text is trimmed on the way in, so validators never see surrounding
/// whitespace.
#[derive(Debug, Clone, Default)]
pub struct RawInput {
    values: HashMap<String, RawValue>,
}

impl RawInput {
    /// Create empty input (an unsubmitted form)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from form fields with automatic trimming
    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        let values = fields
            .into_iter()
            .map(|(k, v)| (k, RawValue::Text(v.trim().to_string())))
            .collect();

        Self { values }
    }

    /// Create from key/value pairs; repeated keys accumulate into a list
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut input = Self::new();
        for (key, value) in pairs {
            input.push_text(key.into(), value.as_ref().trim().to_string());
        }
        input
    }

    /// Parse an `application/x-www-form-urlencoded` body
    pub fn from_urlencoded(body: &str) -> Self {
        let decode = |s: &str| {
            let spaced = s.replace('+', " ");
            urlencoding::decode(&spaced)
                .map(|cow| cow.into_owned())
                .unwrap_or(spaced)
        };

        let pairs = body
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (decode(k), decode(v)),
                None => (decode(pair), String::new()),
            });

        Self::from_pairs(pairs)
    }

    /// Create from a JSON object; arrays become lists, scalars become text
    pub fn from_json(json: &JsonValue) -> Self {
        let mut input = Self::new();

        if let JsonValue::Object(map) = json {
            for (key, value) in map {
                let raw = match value {
                    JsonValue::Null => continue,
                    JsonValue::String(s) => RawValue::Text(s.trim().to_string()),
                    JsonValue::Array(items) => {
                        RawValue::List(items.iter().map(json_scalar_to_text).collect())
                    }
                    other => RawValue::Text(json_scalar_to_text(other)),
                };
                input.values.insert(key.clone(), raw);
            }
        }

        input
    }

    /// Builder-style insert of a text value (replaces any previous value)
    pub fn with(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.values
            .insert(key.into(), RawValue::Text(value.as_ref().trim().to_string()));
        self
    }

    /// Builder-style insert of a list value
    pub fn with_list<S: AsRef<str>>(mut self, key: impl Into<String>, values: &[S]) -> Self {
        let items = values.iter().map(|v| v.as_ref().trim().to_string()).collect();
        self.values.insert(key.into(), RawValue::List(items));
        self
    }

    /// Builder-style insert of an uploaded file
    pub fn with_file(mut self, key: impl Into<String>, file: UploadedFile) -> Self {
        self.values.insert(key.into(), RawValue::File(file));
        self
    }

    fn push_text(&mut self, key: String, value: String) {
        match self.values.remove(&key) {
            None => {
                self.values.insert(key, RawValue::Text(value));
            }
            Some(RawValue::Text(first)) => {
                self.values.insert(key, RawValue::List(vec![first, value]));
            }
            Some(RawValue::List(mut items)) => {
                items.push(value);
                self.values.insert(key, RawValue::List(items));
            }
            Some(RawValue::File(file)) => {
                self.values.insert(key, RawValue::File(file));
            }
        }
    }

    /// Get a submitted value
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    /// Get a submitted value as text
    pub fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(RawValue::as_text)
    }

    /// Check if a field was submitted at all
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get all field names
    pub fn keys(&self) -> Vec<&String> {
        self.values.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Nothing submitted
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flattened text view, used to echo values back on a failed submission
    pub fn to_text_map(&self) -> HashMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    RawValue::Text(s) => s.clone(),
                    RawValue::List(items) => items.join(","),
                    RawValue::File(file) => file.filename.clone(),
                };
                (k.clone(), text)
            })
            .collect()
    }
}

fn json_scalar_to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
