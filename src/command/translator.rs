//! Command to operation translation
//!
//! Translation reads the graph (to snapshot nodes and capture old values)
//! but never mutates it.

use super::{Command, CommandKind};
use crate::graph::resolver::{resolve, PropertyRef};
use crate::graph::{GraphError, GraphResult, Node, NodeFactory, NodeId, Path, PropertyValue};
use crate::operation::{ArrayEdit, Diff, GraphOperation};
use crate::schema::Schema;
use indexmap::IndexMap;

pub fn translate(
    schema: &Schema,
    nodes: &IndexMap<NodeId, Node>,
    command: &Command,
) -> GraphResult<GraphOperation> {
    match command.op() {
        CommandKind::Create => {
            let node = match command.args() {
                PropertyValue::Object(raw) => NodeFactory::create(schema, raw)?,
                _ => return Err(GraphError::MissingIdOrType),
            };
            Ok(GraphOperation::Create {
                path: Path::new(&node.id),
                node,
            })
        }
        CommandKind::Delete => {
            let id = match (command.path().first(), command.arg("id")) {
                (Some(segment), _) => NodeId::new(segment.as_key()),
                (None, Some(PropertyValue::String(id))) => NodeId::new(id.as_str()),
                _ => return Err(GraphError::InvalidCommand("delete needs a node id".to_string())),
            };
            let node = nodes
                .get(id.as_str())
                .cloned()
                .ok_or(GraphError::NodeNotFound(id))?;
            Ok(GraphOperation::Delete {
                path: Path::new(&node.id),
                node,
            })
        }
        CommandKind::Set => {
            let value = command
                .arg("value")
                .cloned()
                .ok_or_else(|| GraphError::InvalidCommand("set needs a 'value' argument".to_string()))?;
            let property = resolve(schema, nodes, command.path())?;
            let node = owning_node(nodes, &property)?;
            let prepared = property.prepare_set(schema, node, value)?;
            Ok(GraphOperation::Set {
                path: property.canonical_path(),
                old_value: prepared.old_value,
                new_value: prepared.new_value,
            })
        }
        CommandKind::Update => {
            let property = resolve(schema, nodes, command.path())?;
            if property.is_node() {
                return Err(GraphError::UnsupportedOperation(
                    "update is only supported for node properties".to_string(),
                ));
            }
            let diff = build_diff(schema, &property, command)?;
            Ok(GraphOperation::Update {
                path: property.canonical_path(),
                diff,
                base_type: property.property_type.base().clone(),
            })
        }
    }
}

fn owning_node<'g>(nodes: &'g IndexMap<NodeId, Node>, property: &PropertyRef) -> GraphResult<&'g Node> {
    nodes
        .get(property.node.as_str())
        .ok_or_else(|| GraphError::NodeNotFound(property.node.clone()))
}

/// Build the edit script for an update from its arguments
fn build_diff(schema: &Schema, property: &PropertyRef, command: &Command) -> GraphResult<Diff> {
    if let Some(diff) = command.arg("diff") {
        let diff: Diff = serde_json::from_value(diff.clone().into())
            .map_err(|e| GraphError::InvalidDiff(e.to_string()))?;
        return Ok(diff);
    }

    let current = property.value.clone().unwrap_or_default();
    let (operation, edit) = if let Some(value) = command.arg("push") {
        let items = array_items(property, &current, "push")?;
        let value = coerce_element(schema, property, value.clone())?;
        ("push", ArrayEdit::Insert { pos: items.len(), value })
    } else if let Some(value) = command.arg("delete") {
        let items = array_items(property, &current, "delete")?;
        let value = coerce_element(schema, property, value.clone())?;
        let pos = items
            .iter()
            .position(|item| item == &value)
            .ok_or_else(|| GraphError::KeyError(property.path.clone()))?;
        ("delete", ArrayEdit::Delete { pos, value })
    } else if let Some(insert) = command.arg("insert") {
        let items = array_items(property, &current, "insert")?;
        let pos = insert
            .as_object()
            .and_then(|m| m.get("pos"))
            .and_then(PropertyValue::as_number)
            .filter(|p| *p >= 0.0 && p.fract() == 0.0)
            .map(|p| p as usize)
            .unwrap_or(items.len());
        let value = insert
            .as_object()
            .and_then(|m| m.get("value"))
            .cloned()
            .ok_or_else(|| GraphError::InvalidCommand("insert needs a 'value'".to_string()))?;
        let value = coerce_element(schema, property, value)?;
        ("insert", ArrayEdit::Insert { pos, value })
    } else {
        return Err(GraphError::InvalidCommand(
            "update needs one of 'diff', 'push', 'delete' or 'insert'".to_string(),
        ));
    };

    tracing::trace!("Translated update {} on {}", operation, property.path);
    Ok(Diff::Array(vec![edit]))
}

fn array_items<'v>(
    property: &PropertyRef,
    current: &'v PropertyValue,
    operation: &str,
) -> GraphResult<&'v Vec<PropertyValue>> {
    match (property.property_type.base(), current) {
        (tag, PropertyValue::Array(items)) if tag.is_array() => Ok(items),
        _ => Err(GraphError::UnsupportedPropertyType {
            operation: operation.to_string(),
            property_type: property.property_type.to_string(),
        }),
    }
}

fn coerce_element(schema: &Schema, property: &PropertyRef, value: PropertyValue) -> GraphResult<PropertyValue> {
    match property.property_type.element() {
        Some(element) if property.property_type.tags().len() > 1 => {
            Ok(schema.parse_value(element.base(), value)?)
        }
        _ => Ok(value),
    }
}
