//! Node records and the factory that builds them from raw input
//!
//! A node carries exactly the properties its schema type resolves to:
//! undeclared input keys are dropped, missing keys receive the schema's
//! default for their base type.

use super::error::{GraphError, GraphResult};
use super::property::{PropertyMap, PropertyValue};
use super::types::{NodeId, TypeName};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};

/// A schema-conformant node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Declared schema type
    #[serde(rename = "type")]
    pub type_name: TypeName,

    /// Schema-declared properties, in declaration order
    #[serde(flatten)]
    pub properties: PropertyMap,
}

impl Node {
    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn get_property_mut(&mut self, key: &str) -> Option<&mut PropertyValue> {
        self.properties.get_mut(key)
    }

    /// Check if property exists
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Get number of properties
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// The node as a plain object value, `id` and `type` first
    pub fn to_value(&self) -> PropertyValue {
        let mut map = PropertyMap::with_capacity(self.properties.len() + 2);
        map.insert("id".to_string(), PropertyValue::String(self.id.to_string()));
        map.insert("type".to_string(), PropertyValue::String(self.type_name.to_string()));
        for (key, value) in &self.properties {
            map.insert(key.clone(), value.clone());
        }
        PropertyValue::Object(map)
    }
}

/// Builds nodes from raw property maps
pub struct NodeFactory;

impl NodeFactory {
    /// Construct a node of `raw["type"]` with id `raw["id"]`
    ///
    /// Supplied values are coerced to their declared base type; missing or
    /// null ones take the type's default.
    pub fn create(schema: &Schema, raw: &PropertyMap) -> GraphResult<Node> {
        let id = raw.get("id").and_then(PropertyValue::as_str);
        let type_name = raw.get("type").and_then(PropertyValue::as_str);
        let (id, type_name) = match (id, type_name) {
            (Some(id), Some(type_name)) if !id.is_empty() && !type_name.is_empty() => {
                (id, type_name)
            }
            _ => return Err(GraphError::MissingIdOrType),
        };

        let declared = schema.properties(type_name)?;
        let mut properties = PropertyMap::with_capacity(declared.len());
        for (key, property_type) in declared {
            let base = property_type.base();
            let value = match raw.get(key) {
                Some(value) if !value.is_null() => schema.parse_value(base, value.clone())?,
                _ => schema.default_value(base).unwrap_or_default(),
            };
            properties.insert(key.clone(), value);
        }

        Ok(Node {
            id: NodeId::new(id),
            type_name: TypeName::new(type_name),
            properties,
        })
    }

    /// Convenience over [`NodeFactory::create`] for an object value
    pub fn from_value(schema: &Schema, raw: &PropertyValue) -> GraphResult<Node> {
        match raw {
            PropertyValue::Object(map) => Self::create(schema, map),
            _ => Err(GraphError::MissingIdOrType),
        }
    }
}
