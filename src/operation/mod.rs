//! Editable-value operations
//!
//! Operations are self-describing effects: each carries whatever pre-state
//! it needs (node snapshots, old values, reversible edit scripts) so it can
//! be inverted, or transformed by an external collaborator, without reading
//! the graph again. Application goes through an [`ApplyTarget`], the small
//! surface the graph exposes to operations.

pub mod diff;

pub use diff::{ArrayEdit, Diff, ObjectEdit, TextEdit};

use crate::graph::{GraphResult, Node, Path, PropertyValue};
use crate::schema::TypeTag;
use serde::{Deserialize, Serialize};

/// The mutation surface operations are applied through
pub trait ApplyTarget {
    /// Current value at `path` (the whole node for a single-segment path)
    fn get(&self, path: &Path) -> GraphResult<PropertyValue>;

    fn create(&mut self, node: Node) -> GraphResult<()>;

    /// Coerce and store `value` at `path`
    fn set(&mut self, path: &Path, value: PropertyValue) -> GraphResult<()>;

    fn delete(&mut self, node: &Node) -> GraphResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum GraphOperation {
    Create {
        path: Path,
        node: Node,
    },
    Delete {
        path: Path,
        node: Node,
    },
    Update {
        path: Path,
        diff: Diff,
        base_type: TypeTag,
    },
    Set {
        path: Path,
        old_value: PropertyValue,
        new_value: PropertyValue,
    },
}

impl GraphOperation {
    pub fn path(&self) -> &Path {
        match self {
            GraphOperation::Create { path, .. }
            | GraphOperation::Delete { path, .. }
            | GraphOperation::Update { path, .. }
            | GraphOperation::Set { path, .. } => path,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GraphOperation::Create { .. } => "create",
            GraphOperation::Delete { .. } => "delete",
            GraphOperation::Update { .. } => "update",
            GraphOperation::Set { .. } => "set",
        }
    }

    /// Apply the operation through `target`
    pub fn apply(&self, target: &mut dyn ApplyTarget) -> GraphResult<()> {
        match self {
            GraphOperation::Create { node, .. } => target.create(node.clone()),
            GraphOperation::Delete { node, .. } => target.delete(node),
            GraphOperation::Set { path, new_value, .. } => target.set(path, new_value.clone()),
            GraphOperation::Update { path, diff, .. } => {
                let current = target.get(path)?;
                let updated = diff.apply(current)?;
                target.set(path, updated)
            }
        }
    }

    /// The operation that undoes this one
    pub fn invert(&self) -> GraphOperation {
        match self {
            GraphOperation::Create { path, node } => GraphOperation::Delete {
                path: path.clone(),
                node: node.clone(),
            },
            GraphOperation::Delete { path, node } => GraphOperation::Create {
                path: path.clone(),
                node: node.clone(),
            },
            GraphOperation::Update { path, diff, base_type } => GraphOperation::Update {
                path: path.clone(),
                diff: diff.invert(),
                base_type: base_type.clone(),
            },
            GraphOperation::Set { path, old_value, new_value } => GraphOperation::Set {
                path: path.clone(),
                old_value: new_value.clone(),
                new_value: old_value.clone(),
            },
        }
    }
}
