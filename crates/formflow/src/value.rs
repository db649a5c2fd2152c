// File: src/value.rs
// Purpose: Typed values produced by field validation

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use formflow_validation::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;

/// Metadata of an uploaded file; the bytes themselves stay with the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub size: u64,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.map(str::to_string),
            size,
        }
    }
}

/// Secret text (passwords). Never printed or serialized in clear.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain text, for hashing or comparison only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("********")
    }
}

/// A validated, typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Secret(Secret),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Bool(bool),
    /// true, false, or unknown
    TriState(Option<bool>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Choice(String),
    Choices(Vec<String>),
    File(UploadedFile),
    Ip(IpAddr),
    /// An optional field left empty
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_secret(&self) -> Option<&Secret> {
        match self {
            Value::Secret(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Choice(s) => f.write_str(s),
            Value::Secret(_) => f.write_str("********"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Bool(b) => write!(f, "{}", b),
            Value::TriState(Some(b)) => write!(f, "{}", b),
            Value::TriState(None) => f.write_str("unknown"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Value::Choices(items) => f.write_str(&items.join(", ")),
            Value::File(file) => f.write_str(&file.filename),
            Value::Ip(ip) => write!(f, "{}", ip),
            Value::Null => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) | Value::Choice(s) => serializer.serialize_str(s),
            Value::Secret(secret) => secret.serialize(serializer),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::TriState(state) => state.serialize(serializer),
            Value::Choices(items) => items.serialize(serializer),
            Value::File(file) => file.serialize(serializer),
            Value::Null => serializer.serialize_none(),
            Value::Decimal(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::DateTime(_)
            | Value::Ip(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let value = Value::Secret(Secret::new("hunter22"));
        assert_eq!(format!("{:?}", value), "Secret(Secret(********))");
        assert_eq!(value.to_string(), "********");
        assert_eq!(serde_json::to_value(&value).unwrap(), serde_json::json!("********"));
    }

    #[test]
    fn test_display_formats() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2025-06-12");
        assert_eq!(Value::TriState(None).to_string(), "unknown");
        assert_eq!(
            Value::Choices(vec!["tech".into(), "art".into()]).to_string(),
            "tech, art"
        );
        assert_eq!(Value::Decimal("4.50".parse().unwrap()).to_string(), "4.50");
    }

    #[test]
    fn test_serialize_shapes() {
        assert_eq!(serde_json::to_value(Value::Integer(4)).unwrap(), serde_json::json!(4));
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), serde_json::Value::Null);
        assert_eq!(
            serde_json::to_value(Value::TriState(Some(false))).unwrap(),
            serde_json::json!(false)
        );
        assert_eq!(
            serde_json::to_value(Value::Ip("10.0.0.1".parse().unwrap())).unwrap(),
            serde_json::json!("10.0.0.1")
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(7i64).as_i64(), Some(7));
        assert!(Value::Null.is_null());
        assert!(Value::from(true).as_str().is_none());
    }
}
