//! Default values and type-directed value coercion

use super::types::{TypeTag, ValueTag};
use super::SchemaError;
use crate::graph::{PropertyMap, PropertyValue};
use chrono::{DateTime, TimeZone, Utc};

/// Zero value for a base tag; references have none and must be given explicitly
pub fn default_value(tag: &TypeTag) -> Option<PropertyValue> {
    let value = match tag {
        TypeTag::Value(ValueTag::Object) => PropertyValue::Object(PropertyMap::new()),
        TypeTag::Value(ValueTag::Array) => PropertyValue::Array(Vec::new()),
        TypeTag::Value(ValueTag::String) => PropertyValue::String(String::new()),
        TypeTag::Value(ValueTag::Number) => PropertyValue::Number(0.0),
        TypeTag::Value(ValueTag::Boolean) => PropertyValue::Boolean(false),
        TypeTag::Value(ValueTag::Date) => PropertyValue::Date(Utc::now()),
        TypeTag::Ref(_) => return None,
    };
    Some(value)
}

/// Validate and coerce `raw` to `tag`.
///
/// Text is parsed according to the tag; anything else must already have the
/// tag's runtime shape. The value is taken by ownership, so the result never
/// shares structure with the caller's input.
pub fn parse_value(tag: &TypeTag, raw: PropertyValue) -> Result<PropertyValue, SchemaError> {
    let tag = match tag {
        // A reference holds the id of the referenced node, or nothing.
        TypeTag::Ref(_) => {
            return match raw {
                PropertyValue::String(_) | PropertyValue::Null => Ok(raw),
                other => Err(mismatch(tag, &other)),
            };
        }
        TypeTag::Value(v) => *v,
    };

    match raw {
        PropertyValue::String(text) => parse_text(tag, text),
        other => check_shape(tag, other),
    }
}

fn parse_text(tag: ValueTag, text: String) -> Result<PropertyValue, SchemaError> {
    match tag {
        ValueTag::String => Ok(PropertyValue::String(text)),
        ValueTag::Object | ValueTag::Array => {
            let decoded: serde_json::Value = serde_json::from_str(&text).map_err(|_| {
                SchemaError::TypeMismatch {
                    expected: tag.as_str().to_string(),
                    found: format!("unparsable text {:?}", text),
                }
            })?;
            check_shape(tag, decoded.into())
        }
        ValueTag::Number => text
            .trim()
            .parse::<f64>()
            .map(PropertyValue::Number)
            .map_err(|_| SchemaError::TypeMismatch {
                expected: "number".to_string(),
                found: format!("text {:?}", text),
            }),
        ValueTag::Boolean => match text.as_str() {
            "true" => Ok(PropertyValue::Boolean(true)),
            "false" => Ok(PropertyValue::Boolean(false)),
            _ => Err(SchemaError::InvalidBoolean(text)),
        },
        ValueTag::Date => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| PropertyValue::Date(dt.with_timezone(&Utc)))
            .map_err(|_| SchemaError::TypeMismatch {
                expected: "date".to_string(),
                found: format!("text {:?}", text),
            }),
    }
}

fn check_shape(tag: ValueTag, value: PropertyValue) -> Result<PropertyValue, SchemaError> {
    match (tag, value) {
        (ValueTag::Object, v @ PropertyValue::Object(_)) => Ok(v),
        (ValueTag::Array, v @ PropertyValue::Array(_)) => Ok(v),
        (ValueTag::String, v @ PropertyValue::String(_)) => Ok(v),
        (ValueTag::Number, v @ PropertyValue::Number(_)) => Ok(v),
        (ValueTag::Boolean, v @ PropertyValue::Boolean(_)) => Ok(v),
        (ValueTag::Date, v @ PropertyValue::Date(_)) => Ok(v),
        // Numeric dates are milliseconds since the Unix epoch.
        (ValueTag::Date, PropertyValue::Number(ms)) => Utc
            .timestamp_millis_opt(ms as i64)
            .single()
            .map(PropertyValue::Date)
            .ok_or_else(|| SchemaError::TypeMismatch {
                expected: "date".to_string(),
                found: format!("out of range timestamp {}", ms),
            }),
        (tag, other) => Err(SchemaError::TypeMismatch {
            expected: tag.as_str().to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

fn mismatch(tag: &TypeTag, value: &PropertyValue) -> SchemaError {
    SchemaError::TypeMismatch {
        expected: tag.to_string(),
        found: value.type_name().to_string(),
    }
}
