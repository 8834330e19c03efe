//! Declarative schema description
//!
//! ```yaml
//! types:
//!   Person:
//!     properties:
//!       name: string
//!       friends: [array, Person]
//!   Employee:
//!     parent: Person
//!     properties:
//!       salary: number
//! indexes:
//!   by_name:
//!     type: Person
//!     properties: [name]
//! ```

use super::SchemaError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Property type as written in a description: `"string"` or `["array", "string"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyTypeSpec {
    Single(String),
    Composite(Vec<String>),
}

impl PropertyTypeSpec {
    pub fn tags(&self) -> Vec<&str> {
        match self {
            PropertyTypeSpec::Single(tag) => vec![tag.as_str()],
            PropertyTypeSpec::Composite(tags) => tags.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for PropertyTypeSpec {
    fn from(tag: &str) -> Self {
        PropertyTypeSpec::Single(tag.to_string())
    }
}

impl From<Vec<&str>> for PropertyTypeSpec {
    fn from(tags: Vec<&str>) -> Self {
        PropertyTypeSpec::Composite(tags.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyTypeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub properties: Vec<String>,
}

/// Complete schema description: types and named indexes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub types: IndexMap<String, TypeDefinition>,
    #[serde(default)]
    pub indexes: IndexMap<String, IndexDefinition>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::InvalidDefinition(e.to_string()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text).map_err(|e| SchemaError::InvalidDefinition(e.to_string()))
    }

    /// Builder: declare a type
    pub fn with_type<I, K, P>(mut self, name: &str, parent: Option<&str>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PropertyTypeSpec>,
    {
        self.types.insert(
            name.to_string(),
            TypeDefinition {
                parent: parent.map(str::to_string),
                properties: properties
                    .into_iter()
                    .map(|(k, p)| (k.into(), p.into()))
                    .collect(),
            },
        );
        self
    }

    /// Builder: declare a named index
    pub fn with_index(mut self, name: &str, type_name: &str, properties: &[&str]) -> Self {
        self.indexes.insert(
            name.to_string(),
            IndexDefinition {
                type_name: type_name.to_string(),
                properties: properties.iter().map(|p| p.to_string()).collect(),
            },
        );
        self
    }
}
