//! Commands: normalized mutation requests
//!
//! A command is accepted either in canonical object form
//! `{"op": "set", "path": ["p1", "name"], "args": {"value": "Bea"}}` or in the
//! positional shorthand `["set", "p1", "name", {"value": "Bea"}]`, where a
//! trailing array/object element is taken as the arguments.

pub mod translator;

pub use translator::translate;

use crate::graph::{GraphError, GraphResult, NodeId, Path, PathSegment, PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Create,
    Delete,
    Update,
    Set,
}

impl CommandKind {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "create" => Some(CommandKind::Create),
            "delete" => Some(CommandKind::Delete),
            "update" => Some(CommandKind::Update),
            "set" => Some(CommandKind::Set),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Create => "create",
            CommandKind::Delete => "delete",
            CommandKind::Update => "update",
            CommandKind::Set => "set",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized mutation request; an instruction, not an effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    op: CommandKind,
    #[serde(default)]
    path: Path,
    #[serde(default)]
    args: PropertyValue,
}

impl Command {
    pub fn new(op: CommandKind, path: Path, args: PropertyValue) -> Self {
        Command { op, path, args }
    }

    /// Create a node; `node` holds `id`, `type` and property values
    pub fn create(node: impl Into<PropertyValue>) -> Self {
        Command::new(CommandKind::Create, Path::default(), node.into())
    }

    pub fn delete(id: impl Into<NodeId>) -> Self {
        Command::new(CommandKind::Delete, Path::new(id.into()), PropertyValue::Null)
    }

    pub fn set(path: impl Into<Path>, value: impl Into<PropertyValue>) -> Self {
        let mut args = PropertyMap::new();
        args.insert("value".to_string(), value.into());
        Command::new(CommandKind::Set, path.into(), PropertyValue::Object(args))
    }

    /// Update with `{"diff": …}`, `{"push": v}`, `{"delete": v}` or
    /// `{"insert": {"pos": n, "value": v}}`
    pub fn update(path: impl Into<Path>, args: impl Into<PropertyValue>) -> Self {
        Command::new(CommandKind::Update, path.into(), args.into())
    }

    /// Normalize either accepted notation
    pub fn normalize(spec: Value) -> GraphResult<Self> {
        match spec {
            Value::Null => Err(GraphError::InvalidCommand("no command given".to_string())),
            Value::Array(items) => Self::from_positional(items),
            Value::Object(_) => {
                serde_json::from_value(spec).map_err(|e| GraphError::InvalidCommand(e.to_string()))
            }
            other => Err(GraphError::InvalidCommand(format!("unsupported command notation: {}", other))),
        }
    }

    pub fn from_json_str(text: &str) -> GraphResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| GraphError::InvalidCommand(e.to_string()))?;
        Self::normalize(value)
    }

    fn from_positional(mut items: Vec<Value>) -> GraphResult<Self> {
        if items.is_empty() {
            return Err(GraphError::InvalidCommand("no command given".to_string()));
        }
        let op = match items.remove(0) {
            Value::String(op) => CommandKind::parse(&op)
                .ok_or_else(|| GraphError::InvalidCommand(format!("unknown operation {:?}", op)))?,
            other => return Err(GraphError::InvalidCommand(format!("operation must be a string, got {}", other))),
        };

        let has_args = matches!(items.last(), Some(Value::Object(_)) | Some(Value::Array(_)));
        let args = if has_args {
            items.pop().map(PropertyValue::from).unwrap_or_default()
        } else {
            PropertyValue::Null
        };

        let path = items
            .into_iter()
            .map(|segment| match segment {
                Value::String(key) => Ok(PathSegment::Key(key)),
                Value::Number(n) => n
                    .as_u64()
                    .map(|i| PathSegment::Index(i as usize))
                    .ok_or_else(|| GraphError::InvalidCommand(format!("invalid path segment {}", n))),
                other => Err(GraphError::InvalidCommand(format!("invalid path segment {}", other))),
            })
            .collect::<GraphResult<Path>>()?;

        Ok(Command { op, path, args })
    }

    pub fn op(&self) -> CommandKind {
        self.op
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn args(&self) -> &PropertyValue {
        &self.args
    }

    /// Named argument, when the arguments are an object
    pub fn arg(&self, name: &str) -> Option<&PropertyValue> {
        self.args.as_object().and_then(|map| map.get(name))
    }

    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("op".to_string(), Value::String(self.op.as_str().to_string()));
        map.insert(
            "path".to_string(),
            serde_json::to_value(&self.path).unwrap_or(Value::Array(Vec::new())),
        );
        map.insert("args".to_string(), self.args.clone().into());
        Value::Object(map)
    }
}

impl TryFrom<Value> for Command {
    type Error = GraphError;

    fn try_from(value: Value) -> GraphResult<Self> {
        Command::normalize(value)
    }
}
