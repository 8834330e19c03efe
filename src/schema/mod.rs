//! Schema: type hierarchy, property types and index declarations
//!
//! A `Schema` is built once from a [`SchemaDefinition`] and never mutated
//! afterwards. Type chains and merged property maps are resolved eagerly so
//! lookups on the hot path are plain map reads.

pub mod coerce;
pub mod definition;
pub mod types;

pub use coerce::{default_value, parse_value};
pub use definition::{IndexDefinition, PropertyTypeSpec, SchemaDefinition, TypeDefinition};
pub use types::{PropertyType, TypeTag, ValueTag};

use crate::graph::{PropertyValue, TypeName};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised by schema construction, lookups and value coercion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Property '{key}' not found on type {type_name}")]
    PropertyNotFound { type_name: String, key: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid boolean literal: {0:?}")]
    InvalidBoolean(String),

    #[error("Index '{0}' declares more than one property; compound indexes are not supported")]
    UnsupportedIndex(String),

    #[error("Invalid schema definition: {0}")]
    InvalidDefinition(String),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// A declared type: optional parent and its own property declarations
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: TypeName,
    pub parent: Option<TypeName>,
    pub properties: IndexMap<String, PropertyType>,
}

/// A declared index: target type (and subtypes), optional grouping property
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    pub type_name: TypeName,
    pub group_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Schema {
    types: IndexMap<TypeName, TypeDescriptor>,
    chains: HashMap<TypeName, Vec<TypeName>>,
    resolved: HashMap<TypeName, IndexMap<String, PropertyType>>,
    indexes: IndexMap<String, IndexSpec>,
}

impl Schema {
    /// Build a schema, checking that every referenced type resolves
    pub fn new(definition: SchemaDefinition) -> SchemaResult<Self> {
        let declared: HashSet<&str> = definition.types.keys().map(String::as_str).collect();

        let mut types = IndexMap::with_capacity(definition.types.len());
        for (name, def) in &definition.types {
            if let Some(parent) = &def.parent {
                if !declared.contains(parent.as_str()) {
                    return Err(SchemaError::UnknownType(parent.clone()));
                }
            }

            let mut properties = IndexMap::with_capacity(def.properties.len());
            for (key, spec) in &def.properties {
                let tags: Vec<TypeTag> = spec.tags().into_iter().map(TypeTag::parse).collect();
                for tag in &tags {
                    if let TypeTag::Ref(target) = tag {
                        if !declared.contains(target.as_str()) {
                            return Err(SchemaError::UnknownType(target.to_string()));
                        }
                    }
                }
                properties.insert(key.clone(), PropertyType::new(tags));
            }

            let name = TypeName::new(name.as_str());
            types.insert(
                name.clone(),
                TypeDescriptor {
                    name,
                    parent: def.parent.as_deref().map(TypeName::new),
                    properties,
                },
            );
        }

        let mut chains = HashMap::with_capacity(types.len());
        let mut resolved = HashMap::with_capacity(types.len());
        for name in types.keys() {
            let chain = Self::build_chain(&types, name)?;
            let mut merged = IndexMap::new();
            for ancestor in &chain {
                for (key, ty) in &types[ancestor].properties {
                    merged.insert(key.clone(), ty.clone());
                }
            }
            resolved.insert(name.clone(), merged);
            chains.insert(name.clone(), chain);
        }

        let mut indexes = IndexMap::with_capacity(definition.indexes.len());
        for (name, def) in &definition.indexes {
            if def.properties.len() > 1 {
                return Err(SchemaError::UnsupportedIndex(name.clone()));
            }
            if !types.contains_key(def.type_name.as_str()) {
                return Err(SchemaError::UnknownType(def.type_name.clone()));
            }
            if let Some(key) = def.properties.first() {
                let declared = resolved
                    .get(def.type_name.as_str())
                    .is_some_and(|properties| properties.contains_key(key));
                if !declared {
                    return Err(SchemaError::PropertyNotFound {
                        type_name: def.type_name.clone(),
                        key: key.clone(),
                    });
                }
            }
            indexes.insert(
                name.clone(),
                IndexSpec {
                    name: name.clone(),
                    type_name: TypeName::new(def.type_name.as_str()),
                    group_by: def.properties.first().cloned(),
                },
            );
        }

        Ok(Schema { types, chains, resolved, indexes })
    }

    fn build_chain(
        types: &IndexMap<TypeName, TypeDescriptor>,
        name: &TypeName,
    ) -> SchemaResult<Vec<TypeName>> {
        let mut chain = vec![name.clone()];
        let mut current = &types[name];
        while let Some(parent) = &current.parent {
            if chain.contains(parent) {
                return Err(SchemaError::InvalidDefinition(format!(
                    "cyclic parent chain through {}",
                    parent
                )));
            }
            chain.push(parent.clone());
            current = &types[parent];
        }
        chain.reverse();
        Ok(chain)
    }

    /// Type descriptor, if declared
    pub fn get_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> {
        self.types.keys()
    }

    /// Ancestors of `name` from the root down to `name` itself
    pub fn type_chain(&self, name: &str) -> SchemaResult<&[TypeName]> {
        self.chains
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Root ancestor of `name`
    pub fn base_type(&self, name: &str) -> SchemaResult<&TypeName> {
        Ok(&self.type_chain(name)?[0])
    }

    /// True if `target` appears in the type chain of `name`
    pub fn is_instance_of(&self, name: &str, target: &str) -> bool {
        self.chains
            .get(name)
            .map(|chain| chain.iter().any(|t| t.as_str() == target))
            .unwrap_or(false)
    }

    /// Merged properties over the whole chain; descendants win on collision
    pub fn properties(&self, name: &str) -> SchemaResult<&IndexMap<String, PropertyType>> {
        self.resolved
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    pub fn property_type(&self, name: &str, key: &str) -> SchemaResult<&PropertyType> {
        self.properties(name)?
            .get(key)
            .ok_or_else(|| SchemaError::PropertyNotFound {
                type_name: name.to_string(),
                key: key.to_string(),
            })
    }

    pub fn property_base_type(&self, name: &str, key: &str) -> SchemaResult<&TypeTag> {
        Ok(self.property_type(name, key)?.base())
    }

    pub fn default_value(&self, tag: &TypeTag) -> Option<PropertyValue> {
        default_value(tag)
    }

    pub fn parse_value(&self, tag: &TypeTag, raw: PropertyValue) -> SchemaResult<PropertyValue> {
        parse_value(tag, raw)
    }

    pub fn indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.indexes.values()
    }

    pub fn index(&self, name: &str) -> Option<&IndexSpec> {
        self.indexes.get(name)
    }
}

impl TryFrom<SchemaDefinition> for Schema {
    type Error = SchemaError;

    fn try_from(definition: SchemaDefinition) -> SchemaResult<Self> {
        Schema::new(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Schema {
        let def = SchemaDefinition::new()
            .with_type("Person", None, [("name", "string"), ("age", "number")])
            .with_type(
                "Employee",
                Some("Person"),
                [("age", PropertyTypeSpec::from("string")), ("boss", "Person".into())],
            )
            .with_type("Manager", Some("Employee"), [("reports", vec!["array", "Employee"])])
            .with_index("people", "Person", &[])
            .with_index("by_name", "Person", &["name"]);
        Schema::new(def).unwrap()
    }

    #[test]
    fn test_type_chain() {
        let schema = people();
        let chain: Vec<&str> = schema.type_chain("Manager").unwrap().iter().map(|t| t.as_str()).collect();
        assert_eq!(chain, vec!["Person", "Employee", "Manager"]);
        assert_eq!(schema.base_type("Manager").unwrap().as_str(), "Person");
        assert!(schema.is_instance_of("Manager", "Person"));
        assert!(!schema.is_instance_of("Person", "Manager"));

        let err = schema.type_chain("Robot").unwrap_err();
        assert_eq!(err, SchemaError::UnknownType("Robot".to_string()));
    }

    #[test]
    fn test_properties_merge_child_wins() {
        let schema = people();
        let person = schema.properties("Person").unwrap();
        let manager = schema.properties("Manager").unwrap();

        for key in person.keys() {
            assert!(manager.contains_key(key));
        }
        assert_eq!(
            schema.property_base_type("Employee", "age").unwrap(),
            &TypeTag::Value(ValueTag::String)
        );
        assert_eq!(
            schema.property_base_type("Person", "age").unwrap(),
            &TypeTag::Value(ValueTag::Number)
        );
        assert_eq!(
            schema.property_base_type("Manager", "reports").unwrap(),
            &TypeTag::Value(ValueTag::Array)
        );
    }

    #[test]
    fn test_property_not_found() {
        let schema = people();
        let err = schema.property_type("Person", "boss").unwrap_err();
        assert!(matches!(err, SchemaError::PropertyNotFound { .. }));
    }

    #[test]
    fn test_property_type_normalized() {
        let schema = people();
        let boss = schema.property_type("Employee", "boss").unwrap();
        assert_eq!(boss.tags().len(), 1);
        assert_eq!(boss.reference().map(|t| t.as_str()), Some("Person"));
    }

    #[test]
    fn test_indexes() {
        let schema = people();
        assert_eq!(schema.index("people").unwrap().group_by, None);
        assert_eq!(schema.index("by_name").unwrap().group_by.as_deref(), Some("name"));
        assert_eq!(schema.indexes().count(), 2);
    }

    #[test]
    fn test_compound_index_rejected() {
        let def = SchemaDefinition::new()
            .with_type("Person", None, [("name", "string"), ("age", "number")])
            .with_index("by_both", "Person", &["name", "age"]);
        let err = Schema::new(def).unwrap_err();
        assert_eq!(err, SchemaError::UnsupportedIndex("by_both".into()));
    }

    #[test]
    fn test_index_grouping_property_must_be_declared() {
        let def = SchemaDefinition::new()
            .with_type("Person", None, [("name", "string")])
            .with_index("by_name", "Person", &["nmae"]);
        assert_eq!(
            Schema::new(def).unwrap_err(),
            SchemaError::PropertyNotFound { type_name: "Person".into(), key: "nmae".into() }
        );

        // inherited properties can group a subtype's index
        let def = SchemaDefinition::new()
            .with_type("Person", None, [("name", "string")])
            .with_type("Employee", Some("Person"), [("salary", "number")])
            .with_index("staff_by_name", "Employee", &["name"]);
        assert!(Schema::new(def).is_ok());
    }

    #[test]
    fn test_unresolved_references() {
        let def = SchemaDefinition::new().with_type("Person", Some("Being"), [("name", "string")]);
        assert_eq!(Schema::new(def).unwrap_err(), SchemaError::UnknownType("Being".into()));

        let def = SchemaDefinition::new().with_type("Person", None, [("pet", "Dog")]);
        assert_eq!(Schema::new(def).unwrap_err(), SchemaError::UnknownType("Dog".into()));

        let def = SchemaDefinition::new().with_index("things", "Thing", &[]);
        assert_eq!(Schema::new(def).unwrap_err(), SchemaError::UnknownType("Thing".into()));
    }

    #[test]
    fn test_cyclic_parent_chain() {
        let def = SchemaDefinition::new()
            .with_type("A", Some("B"), Vec::<(&str, &str)>::new())
            .with_type("B", Some("A"), Vec::<(&str, &str)>::new());
        assert!(matches!(Schema::new(def), Err(SchemaError::InvalidDefinition(_))));
    }
}
