//! Path resolution
//!
//! A path is walked one segment at a time. At each step the cursor decides,
//! from the schema type of what it currently points at, whether the segment
//! names a node, a property/object key, or an array position:
//!
//! - at the graph root, or after a reference-typed value, the segment is a
//!   node id and the walk re-roots on that node;
//! - on a node, the segment is a property key declared by its type chain;
//! - inside an array value it is a position, inside an object a key.
//!
//! A path that ends on a reference property does not dereference it: the
//! owning node stays the editable root and the id is the value.

use super::error::{GraphError, GraphResult};
use super::node::Node;
use super::path::{Path, PathSegment};
use super::property::PropertyValue;
use super::types::{NodeId, TypeName};
use crate::schema::{PropertyType, Schema, TypeTag};
use indexmap::IndexMap;

/// One resolution step, in walk order
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveStep {
    EnteringNode(NodeId),
    DescendingField(String),
    ArrayIndex(usize),
}

enum Cursor<'g> {
    Graph,
    Node(&'g Node),
    Value {
        value: Option<&'g PropertyValue>,
        property_type: PropertyType,
    },
}

/// A resolved path
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRef {
    /// The path as given
    pub path: Path,
    /// Node that owns the addressed value
    pub node: NodeId,
    /// Type of the owning node
    pub node_type: TypeName,
    /// Location of the parent container inside the owning node; empty when
    /// the parent is the node itself
    pub parent: Vec<PathSegment>,
    /// Key within the parent; `None` when the path addresses a whole node
    pub key: Option<PathSegment>,
    /// Type of the addressed value
    pub property_type: PropertyType,
    /// Whether `property_type` is declared by the schema or only inferred
    /// from a value nested inside an untyped container
    pub declared: bool,
    /// Current value; `None` when the path addresses a whole node
    pub value: Option<PropertyValue>,
    /// Steps taken during resolution
    pub steps: Vec<ResolveStep>,
}

/// A value write computed against, but not yet applied to, a node
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSet {
    pub node: NodeId,
    /// Top-level property of the owning node that changes
    pub top_key: String,
    pub old_top: PropertyValue,
    pub new_top: PropertyValue,
    /// Value previously at the addressed location
    pub old_value: PropertyValue,
    /// Coerced value written at the addressed location
    pub new_value: PropertyValue,
}

/// Resolve `path` against `nodes`
pub fn resolve(
    schema: &Schema,
    nodes: &IndexMap<NodeId, Node>,
    path: &Path,
) -> GraphResult<PropertyRef> {
    if path.is_empty() {
        return Err(GraphError::KeyError(path.clone()));
    }

    let mut cursor = Cursor::Graph;
    let mut owner: Option<&Node> = None;
    let mut parent: Vec<PathSegment> = Vec::new();
    let mut key: Option<PathSegment> = None;
    let mut declared = true;
    let mut steps = Vec::with_capacity(path.len());

    for segment in path.segments() {
        let step = next_step(&cursor, segment).ok_or_else(|| GraphError::KeyError(path.clone()))?;

        cursor = match &step {
            ResolveStep::EnteringNode(id) => {
                let node = nodes
                    .get(id.as_str())
                    .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
                owner = Some(node);
                parent.clear();
                key = None;
                declared = true;
                Cursor::Node(node)
            }
            ResolveStep::DescendingField(field) => match cursor {
                Cursor::Node(node) => {
                    let property_type = schema.property_type(node.type_name.as_str(), field)?.clone();
                    key = Some(PathSegment::Key(field.clone()));
                    Cursor::Value {
                        value: node.get_property(field),
                        property_type,
                    }
                }
                Cursor::Value { value: Some(PropertyValue::Object(map)), .. } => {
                    parent.extend(key.take());
                    key = Some(PathSegment::Key(field.clone()));
                    declared = false;
                    let value = map.get(field.as_str());
                    Cursor::Value {
                        value,
                        property_type: value.map(PropertyType::of_value).unwrap_or_else(|| {
                            PropertyType::of_value(&PropertyValue::Null)
                        }),
                    }
                }
                _ => return Err(GraphError::KeyError(path.clone())),
            },
            ResolveStep::ArrayIndex(i) => match cursor {
                Cursor::Value {
                    value: Some(PropertyValue::Array(items)),
                    property_type,
                } => {
                    parent.extend(key.take());
                    key = Some(PathSegment::Index(*i));
                    let value = items.get(*i);
                    let property_type = match property_type.element() {
                        Some(element) if property_type.tags().len() > 1 => element,
                        _ => {
                            declared = false;
                            value.map(PropertyType::of_value).unwrap_or_else(|| {
                                PropertyType::of_value(&PropertyValue::Null)
                            })
                        }
                    };
                    Cursor::Value { value, property_type }
                }
                _ => return Err(GraphError::KeyError(path.clone())),
            },
        };
        steps.push(step);
    }

    let owner = owner.ok_or_else(|| GraphError::KeyError(path.clone()))?;
    let (property_type, value) = match cursor {
        Cursor::Node(node) => (PropertyType::scalar(TypeTag::Ref(node.type_name.clone())), None),
        Cursor::Value { value, property_type } => {
            (property_type, Some(value.cloned().unwrap_or_default()))
        }
        Cursor::Graph => return Err(GraphError::KeyError(path.clone())),
    };

    Ok(PropertyRef {
        path: path.clone(),
        node: owner.id.clone(),
        node_type: owner.type_name.clone(),
        parent,
        key,
        property_type,
        declared,
        value,
        steps,
    })
}

fn next_step(cursor: &Cursor<'_>, segment: &PathSegment) -> Option<ResolveStep> {
    match cursor {
        Cursor::Graph => Some(ResolveStep::EnteringNode(NodeId::new(segment.as_key()))),
        Cursor::Node(_) => Some(ResolveStep::DescendingField(segment.as_key().into_owned())),
        Cursor::Value { value, property_type } => {
            if property_type.reference().is_some() {
                return Some(ResolveStep::EnteringNode(NodeId::new(segment.as_key())));
            }
            match value {
                Some(PropertyValue::Array(_)) => segment.as_index().map(ResolveStep::ArrayIndex),
                Some(PropertyValue::Object(_)) => {
                    Some(ResolveStep::DescendingField(segment.as_key().into_owned()))
                }
                _ => None,
            }
        }
    }
}

impl PropertyRef {
    /// True when the path addresses a whole node rather than a property
    pub fn is_node(&self) -> bool {
        self.key.is_none()
    }

    /// Top-level property of the owning node that contains the value
    pub fn top_key(&self) -> Option<String> {
        self.parent
            .first()
            .or(self.key.as_ref())
            .map(|segment| segment.as_key().into_owned())
    }

    /// Location of the value inside the owning node, key included
    pub fn field_path(&self) -> Vec<PathSegment> {
        let mut segments = self.parent.clone();
        segments.extend(self.key.clone());
        segments
    }

    /// Path addressing the same value rooted at its owning node
    pub fn canonical_path(&self) -> Path {
        let mut path = Path::new(&self.node);
        for segment in self.field_path() {
            path.push(segment);
        }
        path
    }

    /// Current value; the whole node when no key is present
    pub fn get(&self, nodes: &IndexMap<NodeId, Node>) -> Option<PropertyValue> {
        match &self.value {
            Some(value) => Some(value.clone()),
            None => nodes.get(self.node.as_str()).map(Node::to_value),
        }
    }

    /// Coerce `value` and compute the write without touching `node`
    pub fn prepare_set(
        &self,
        schema: &Schema,
        node: &Node,
        value: PropertyValue,
    ) -> GraphResult<PreparedSet> {
        let key = self.key.as_ref().ok_or_else(|| {
            GraphError::UnsupportedOperation("set is only supported for node properties".to_string())
        })?;
        let top_key = self.top_key().unwrap_or_default();

        let has_shape = self.value.as_ref().is_some_and(|v| !v.is_null());
        let new_value = if self.declared || (has_shape && !value.is_null()) {
            schema.parse_value(self.property_type.base(), value)?
        } else {
            value
        };

        let old_top = node.get_property(&top_key).cloned().unwrap_or_default();
        let mut new_top = old_top.clone();
        let old_value = if self.parent.is_empty() {
            std::mem::replace(&mut new_top, new_value.clone())
        } else {
            let container = slot_mut(&mut new_top, &self.parent[1..])
                .ok_or_else(|| GraphError::KeyError(self.path.clone()))?;
            write_slot(container, key, new_value.clone())
                .ok_or_else(|| GraphError::KeyError(self.path.clone()))?
        };

        Ok(PreparedSet {
            node: node.id.clone(),
            top_key,
            old_top,
            new_top,
            old_value,
            new_value,
        })
    }

    /// Coerce `value` and write it into `node`, returning the previous value
    pub fn set(&self, schema: &Schema, node: &mut Node, value: PropertyValue) -> GraphResult<PropertyValue> {
        let prepared = self.prepare_set(schema, node, value)?;
        node.properties.insert(prepared.top_key, prepared.new_top);
        Ok(prepared.old_value)
    }
}

/// Walk `segments` below `root`
fn slot_mut<'v>(root: &'v mut PropertyValue, segments: &[PathSegment]) -> Option<&'v mut PropertyValue> {
    let mut current = root;
    for segment in segments {
        current = match current {
            PropertyValue::Object(map) => map.get_mut(segment.as_key().as_ref())?,
            PropertyValue::Array(items) => items.get_mut(segment.as_index()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Store `value` under `key` in `container`, returning what was there
fn write_slot(container: &mut PropertyValue, key: &PathSegment, value: PropertyValue) -> Option<PropertyValue> {
    match container {
        PropertyValue::Object(map) => Some(map.insert(key.as_key().into_owned(), value).unwrap_or_default()),
        PropertyValue::Array(items) => {
            let i = key.as_index()?;
            if i < items.len() {
                Some(std::mem::replace(&mut items[i], value))
            } else if i == items.len() {
                items.push(value);
                Some(PropertyValue::Null)
            } else {
                None
            }
        }
        _ => None,
    }
}
