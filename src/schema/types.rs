//! Property type tags
//!
//! A property type is a non-empty sequence of tags. A single tag denotes a
//! scalar value or a reference to a node type; a leading `array` tag denotes
//! a homogeneous sequence of whatever the remaining tags describe.

use crate::graph::TypeName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in value tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueTag {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Date,
}

impl ValueTag {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "object" => Some(ValueTag::Object),
            "array" => Some(ValueTag::Array),
            "string" => Some(ValueTag::String),
            "number" => Some(ValueTag::Number),
            "boolean" => Some(ValueTag::Boolean),
            "date" => Some(ValueTag::Date),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueTag::Object => "object",
            ValueTag::Array => "array",
            ValueTag::String => "string",
            ValueTag::Number => "number",
            ValueTag::Boolean => "boolean",
            ValueTag::Date => "date",
        }
    }
}

/// One element of a property type: a value tag or a node type reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Value(ValueTag),
    Ref(TypeName),
}

impl TypeTag {
    /// Interpret a tag as written in a schema description
    pub fn parse(tag: &str) -> Self {
        match ValueTag::parse(tag) {
            Some(value) => TypeTag::Value(value),
            None => TypeTag::Ref(TypeName::new(tag)),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeTag::Value(ValueTag::Array))
    }

    pub fn as_ref_type(&self) -> Option<&TypeName> {
        match self {
            TypeTag::Ref(name) => Some(name),
            TypeTag::Value(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Value(v) => v.as_str(),
            TypeTag::Ref(name) => name.as_str(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(TypeTag::parse(&tag))
    }
}

impl From<ValueTag> for TypeTag {
    fn from(tag: ValueTag) -> Self {
        TypeTag::Value(tag)
    }
}

/// Normalized property type, always in array form `[tag, …]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyType {
    tags: Vec<TypeTag>,
}

impl PropertyType {
    /// Build from tags; an empty sequence is promoted to `object`
    pub fn new(tags: Vec<TypeTag>) -> Self {
        if tags.is_empty() {
            return Self::scalar(ValueTag::Object);
        }
        PropertyType { tags }
    }

    pub fn scalar(tag: impl Into<TypeTag>) -> Self {
        PropertyType { tags: vec![tag.into()] }
    }

    pub fn array_of(element: PropertyType) -> Self {
        let mut tags = Vec::with_capacity(element.tags.len() + 1);
        tags.push(TypeTag::Value(ValueTag::Array));
        tags.extend(element.tags);
        PropertyType { tags }
    }

    /// Infer a type from the runtime shape of a value nested below the schema
    pub fn of_value(value: &crate::graph::PropertyValue) -> Self {
        use crate::graph::PropertyValue;
        let tag = match value {
            PropertyValue::Array(_) => ValueTag::Array,
            PropertyValue::String(_) => ValueTag::String,
            PropertyValue::Number(_) => ValueTag::Number,
            PropertyValue::Boolean(_) => ValueTag::Boolean,
            PropertyValue::Date(_) => ValueTag::Date,
            PropertyValue::Object(_) | PropertyValue::Null => ValueTag::Object,
        };
        Self::scalar(tag)
    }

    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    /// First tag, e.g. `array` for `[array, string]`
    pub fn base(&self) -> &TypeTag {
        &self.tags[0]
    }

    /// Element type of a sequence; `None` for non-arrays
    pub fn element(&self) -> Option<PropertyType> {
        if !self.base().is_array() {
            return None;
        }
        let rest = &self.tags[1..];
        if rest.is_empty() {
            // Untyped array: elements are described by their runtime shape.
            return Some(Self::scalar(ValueTag::Object));
        }
        Some(PropertyType { tags: rest.to_vec() })
    }

    /// Node type this property references, if it is a scalar reference
    pub fn reference(&self) -> Option<&TypeName> {
        self.base().as_ref_type()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.len() == 1 {
            return write!(f, "{}", self.tags[0]);
        }
        let names: Vec<&str> = self.tags.iter().map(TypeTag::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
