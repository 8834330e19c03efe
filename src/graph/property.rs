//! Property value types for graph nodes
//!
//! Values are JSON-shaped: they serialize to plain JSON (dates as RFC 3339
//! text) so nodes, commands and operations can cross a wire unchanged.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Property value type supporting the schema's value tags
///
/// Supports:
/// - String
/// - Number (f64)
/// - Boolean
/// - Date (UTC timestamp)
/// - Array (Vec<PropertyValue>)
/// - Object (insertion-ordered map)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<PropertyValue>),
    Object(PropertyMap),
}

/// Property map for storing node properties and nested objects
pub type PropertyMap = IndexMap<String, PropertyValue>;

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Get string value if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get number value if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get date value if this is a date
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            PropertyValue::Date(dt) => Some(dt),
            _ => None,
        }
    }

    /// Get array value if this is an array
    pub fn as_array(&self) -> Option<&Vec<PropertyValue>> {
        match self {
            PropertyValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<PropertyValue>> {
        match self {
            PropertyValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get object value if this is an object
    pub fn as_object(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut PropertyMap> {
        match self {
            PropertyValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// True for arrays and objects
    pub fn is_structured(&self) -> bool {
        matches!(self, PropertyValue::Array(_) | PropertyValue::Object(_))
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Boolean(_) => "boolean",
            PropertyValue::Number(_) => "number",
            PropertyValue::String(_) => "string",
            PropertyValue::Date(_) => "date",
            PropertyValue::Array(_) => "array",
            PropertyValue::Object(_) => "object",
        }
    }

    /// Textual form of the value.
    ///
    /// Strings are returned verbatim, integral numbers without a fraction,
    /// dates as RFC 3339 and structures as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            PropertyValue::Null => String::new(),
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Number(n) => format_number(*n),
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Date(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            PropertyValue::Array(_) | PropertyValue::Object(_) => {
                serde_json::Value::from(self.clone()).to_string()
            }
        }
    }

    /// Key under which a grouped index files this value
    pub fn index_key(&self) -> String {
        self.to_text()
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Null => write!(f, "null"),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(dt: DateTime<Utc>) -> Self {
        PropertyValue::Date(dt)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(arr: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(arr)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(map: PropertyMap) -> Self {
        PropertyValue::Object(map)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Boolean(b),
            Value::Number(n) => PropertyValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => PropertyValue::String(s),
            Value::Array(arr) => PropertyValue::Array(arr.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                PropertyValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<PropertyValue> for serde_json::Value {
    fn from(value: PropertyValue) -> Self {
        use serde_json::Value;
        match value {
            PropertyValue::Null => Value::Null,
            PropertyValue::Boolean(b) => Value::Bool(b),
            PropertyValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
                }
            }
            PropertyValue::String(s) => Value::String(s),
            PropertyValue::Date(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            PropertyValue::Array(arr) => Value::Array(arr.into_iter().map(Into::into).collect()),
            PropertyValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
